//! The interpreter: runs compiled op arrays against an instance's [`Store`].
use crate::config::Config;
use crate::core::Expr;
use crate::core::types::{FuncType, ValType};
use crate::exec::ExecError;
use crate::exec::compile::{BinOp, LoadKind, Op, RelOp, StoreKind, UnOp, compile};
use crate::runtime::store::Store;
use crate::runtime::{
    FuncRef, Function, HostFunction, LocalValue, Value, ValueStack, WasmFunction, check_type,
};
use log::{debug, trace};
use std::rc::Rc;

/// An active structured construct. Branching to it unwinds the operand stack to `height`,
/// keeping the top `arity` values, and continues at `target`.
#[derive(Debug, Clone, Copy)]
struct Label {
    target: usize,
    arity: usize,
    height: usize,
}

/// A suspended or running WebAssembly call. Frames live on the heap, so the depth of the guest
/// call stack is limited by [`Config::max_call_depth`] and never by the host stack.
struct Frame {
    code: Rc<[Op]>,
    store: Rc<Store>,
    locals: Vec<LocalValue>,
    labels: Vec<Label>,
    pc: usize,
    entry: usize,
    arity: usize,
}

impl Frame {
    /// The whole body is the outermost label, so falling off the end and `return` both leave
    /// exactly `arity` values above `entry`.
    fn new(
        code: Rc<[Op]>,
        store: Rc<Store>,
        locals: Vec<LocalValue>,
        entry: usize,
        arity: usize,
    ) -> Self {
        let labels = vec![Label {
            target: code.len(),
            arity,
            height: entry,
        }];
        Frame {
            code,
            store,
            locals,
            labels,
            pc: 0,
            entry,
            arity,
        }
    }
}

/// Why [`Executor::run`] handed control back.
enum Exit {
    Return,
    /// The frame made a call and resumes after it. The type is the call site's, kept only for
    /// callees that have none of their own.
    Call(FuncRef, Option<FuncType>),
}

/// Executes calls on a shared operand stack. One executor serves one call from the embedder
/// and every nested call it makes, so the depth limit and the fuel budget span all of them.
pub(crate) struct Executor<'a> {
    stack: &'a mut ValueStack,
    max_depth: usize,
    fuel: Option<u64>,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(stack: &'a mut ValueStack, config: &Config) -> Self {
        Executor {
            stack,
            max_depth: config.max_call_depth,
            fuel: config.fuel,
        }
    }

    /// Call `func` with its arguments already on the stack. On return the arguments are
    /// replaced by the results.
    ///
    /// `call_site_ty` is the type the caller expects; it supplies the signature of host
    /// functions that were created without one.
    pub(crate) fn invoke(
        &mut self,
        func: &FuncRef,
        call_site_ty: Option<&FuncType>,
    ) -> Result<(), ExecError> {
        self.check_depth(0)?;
        match func.as_ref() {
            Function::Wasm(w) => {
                let frame = self.enter(w, 0)?;
                self.drive(frame)
            }
            Function::Host(h) => self.call_host(h, call_site_ty, 0),
        }
    }

    /// Run `frame` and every call it makes until it returns.
    fn drive(&mut self, frame: Frame) -> Result<(), ExecError> {
        let mut suspended: Vec<Frame> = Vec::new();
        let mut current = frame;
        loop {
            match self.run(&mut current)? {
                Exit::Return => match suspended.pop() {
                    Some(caller) => current = caller,
                    None => return Ok(()),
                },
                Exit::Call(func, call_site_ty) => {
                    let depth = suspended.len() + 1;
                    self.check_depth(depth)?;
                    match func.as_ref() {
                        Function::Wasm(w) => {
                            let callee = self.enter(w, depth)?;
                            suspended.push(std::mem::replace(&mut current, callee));
                        }
                        Function::Host(h) => self.call_host(h, call_site_ty.as_ref(), depth)?,
                    }
                }
            }
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), ExecError> {
        if depth >= self.max_depth {
            return Err(ExecError::CallStackExhausted);
        }
        Ok(())
    }

    /// Move the arguments of a call to `w` off the stack into a fresh frame.
    fn enter(&mut self, w: &WasmFunction, depth: usize) -> Result<Frame, ExecError> {
        let store = w.store.upgrade().ok_or(ExecError::InstanceDropped)?;
        debug!("call {} at depth {depth}", w.ty);

        let args = self.stack.pop_n(w.ty.parameters.len())?;
        let mut locals = w
            .ty
            .parameters
            .iter()
            .zip(args)
            .map(|(ty, value)| LocalValue::with_value(*ty, value))
            .collect::<Result<Vec<_>, _>>()?;
        locals.extend(w.locals.iter().map(|ty| LocalValue::new(*ty)));

        let entry = self.stack.len();
        Ok(Frame::new(
            Rc::clone(&w.code),
            store,
            locals,
            entry,
            w.ty.results.len(),
        ))
    }

    fn call_host(
        &mut self,
        h: &HostFunction,
        call_site_ty: Option<&FuncType>,
        depth: usize,
    ) -> Result<(), ExecError> {
        let ty = h
            .ty
            .as_ref()
            .or(call_site_ty)
            .ok_or(ExecError::UntypedHostFunction)?;
        debug!("call host {ty} at depth {depth}");

        let args = self.stack.pop_n(ty.parameters.len())?;
        for (expected, value) in ty.parameters.iter().zip(&args) {
            check_type(*expected, value)?;
        }

        let results = (h.callable)(&args)?;
        if results.len() != ty.results.len() {
            return Err(ExecError::HostResultArity {
                expected: ty.results.len(),
                actual: results.len(),
            });
        }
        for (expected, value) in ty.results.iter().zip(results) {
            check_type(*expected, &value)?;
            self.stack.push(value);
        }
        Ok(())
    }

    fn consume_fuel(&mut self) -> Result<(), ExecError> {
        if let Some(fuel) = self.fuel.as_mut() {
            if *fuel == 0 {
                return Err(ExecError::FuelExhausted);
            }
            *fuel -= 1;
        }
        Ok(())
    }

    /// Run `frame` until it returns or calls out. A frame that calls out is left positioned
    /// after the call, ready to resume once the callee's results are on the stack.
    fn run(&mut self, frame: &mut Frame) -> Result<Exit, ExecError> {
        let Frame {
            code,
            store,
            locals,
            labels,
            pc,
            entry,
            arity,
        } = frame;

        while let Some(op) = code.get(*pc) {
            self.consume_fuel()?;
            trace!("{:>4}: {op:?}", *pc);
            let next = *pc + 1;

            *pc = match op {
                Op::Unreachable => return Err(ExecError::Unreachable),
                Op::Nop => next,
                Op::Block {
                    params,
                    results,
                    end,
                } => {
                    labels.push(self.label(end + 1, *results, *params)?);
                    next
                }
                Op::Loop { params } => {
                    labels.push(self.label(*pc, *params, *params)?);
                    next
                }
                Op::If {
                    params,
                    results,
                    else_,
                    end,
                } => {
                    let cond = self.stack.pop_i32()?;
                    labels.push(self.label(end + 1, *results, *params)?);
                    match (cond != 0, else_) {
                        (true, _) => next,
                        (false, Some(else_)) => else_ + 1,
                        (false, None) => *end,
                    }
                }
                Op::Else { end } => *end,
                Op::End => {
                    labels.pop();
                    next
                }
                Op::Br(depth) => self.branch(labels, *depth)?,
                Op::BrIf(depth) => {
                    if self.stack.pop_i32()? != 0 {
                        self.branch(labels, *depth)?
                    } else {
                        next
                    }
                }
                Op::BrTable { labels: table, default } => {
                    let i = self.stack.pop_i32()? as u32;
                    let depth = table.get(i as usize).copied().unwrap_or(*default);
                    self.branch(labels, depth)?
                }
                Op::Return => code.len(),
                Op::Call(idx) => {
                    let func = store.func(*idx)?.clone();
                    *pc = next;
                    return Ok(Exit::Call(func, None));
                }
                Op::CallIndirect { table, ty } => {
                    let expected = store.func_type(*ty)?;
                    let i = self.stack.pop_i32()? as u32;
                    let func = store.table(*table)?.borrow().element_at(i)?;
                    if let Some(actual) = func.ty() {
                        if actual != expected {
                            return Err(ExecError::IndirectCallTypeMismatch {
                                expected: expected.clone(),
                                actual: actual.clone(),
                            });
                        }
                    }
                    let call_site_ty = func.ty().is_none().then(|| expected.clone());
                    *pc = next;
                    return Ok(Exit::Call(func, call_site_ty));
                }

                Op::RefNull(t) => {
                    self.stack.push(Value::default_for(ValType::Ref(*t)));
                    next
                }
                Op::RefIsNull => {
                    let value = self.stack.pop()?;
                    if !matches!(value.ty(), ValType::Ref(_)) {
                        return Err(ExecError::TypeMismatch {
                            expected: ValType::FUNCREF,
                            actual: value.ty(),
                        });
                    }
                    self.stack.push(value.is_null_ref() as i32);
                    next
                }
                Op::RefFunc(idx) => {
                    let func = store.func(*idx)?.clone();
                    self.stack.push(Value::FuncRef(Some(func)));
                    next
                }

                Op::Drop => {
                    self.stack.pop()?;
                    next
                }
                Op::Select => {
                    let cond = self.stack.pop_i32()?;
                    let b = self.stack.pop()?;
                    let a = self.stack.pop()?;
                    self.stack.push(if cond != 0 { a } else { b });
                    next
                }

                Op::LocalGet(x) => {
                    local(locals, *x)?.push_to(self.stack)?;
                    next
                }
                Op::LocalSet(x) => {
                    local(locals, *x)?.pop_from(self.stack)?;
                    next
                }
                Op::LocalTee(x) => {
                    let slot = local(locals, *x)?;
                    slot.pop_from(self.stack)?;
                    slot.push_to(self.stack)?;
                    next
                }
                Op::GlobalGet(x) => {
                    store.global(*x)?.borrow().push_to(self.stack)?;
                    next
                }
                Op::GlobalSet(x) => {
                    store.global(*x)?.borrow_mut().pop_from(self.stack)?;
                    next
                }

                Op::Load(kind, offset) => {
                    let addr = effective_address(self.stack.pop_i32()?, *offset);
                    let mem = store.memory(0)?.borrow();
                    let value = match kind {
                        LoadKind::I32 => mem.read_i32(addr)?,
                        LoadKind::I32_8S => mem.read_u8(addr)? as i8 as i32,
                        LoadKind::I32_8U => mem.read_u8(addr)? as i32,
                        LoadKind::I32_16S => mem.read_u16(addr)? as i16 as i32,
                        LoadKind::I32_16U => mem.read_u16(addr)? as i32,
                    };
                    self.stack.push(value);
                    next
                }
                Op::Store(kind, offset) => {
                    let value = self.stack.pop_i32()?;
                    let addr = effective_address(self.stack.pop_i32()?, *offset);
                    let mut mem = store.memory(0)?.borrow_mut();
                    match kind {
                        StoreKind::I32 => mem.write_i32(addr, value)?,
                        StoreKind::I32_8 => mem.write_u8(addr, value as u8)?,
                        StoreKind::I32_16 => mem.write_u16(addr, value as u16)?,
                    }
                    next
                }
                Op::MemorySize => {
                    let pages = store.memory(0)?.borrow().size();
                    self.stack.push(pages as i32);
                    next
                }
                Op::MemoryGrow => {
                    let delta = self.stack.pop_i32()? as u32;
                    let old = store.memory(0)?.borrow_mut().grow(delta);
                    self.stack.push(old.map_or(-1, |pages| pages as i32));
                    next
                }

                Op::I32Const(n) => {
                    self.stack.push(*n);
                    next
                }
                Op::I32Eqz => {
                    let a = self.stack.pop_i32()?;
                    self.stack.push((a == 0) as i32);
                    next
                }
                Op::I32Rel(op) => {
                    let b = self.stack.pop_i32()?;
                    let a = self.stack.pop_i32()?;
                    self.stack.push(compare(*op, a, b) as i32);
                    next
                }
                Op::I32Unary(op) => {
                    let a = self.stack.pop_i32()?;
                    self.stack.push(unary(*op, a));
                    next
                }
                Op::I32Binary(op) => {
                    let b = self.stack.pop_i32()?;
                    let a = self.stack.pop_i32()?;
                    self.stack.push(binary(*op, a, b)?);
                    next
                }

                Op::Unsupported(ty) => return Err(ExecError::UnsupportedType(*ty)),
            };
        }

        self.stack.unwind(*entry, *arity)?;
        Ok(Exit::Return)
    }

    fn label(&self, target: usize, arity: usize, params: usize) -> Result<Label, ExecError> {
        let height = self
            .stack
            .len()
            .checked_sub(params)
            .ok_or(ExecError::StackUnderflow)?;
        Ok(Label {
            target,
            arity,
            height,
        })
    }

    /// Leave the `depth`-th enclosing label, returning the op index to continue at.
    fn branch(&mut self, labels: &mut Vec<Label>, depth: u32) -> Result<usize, ExecError> {
        let idx = labels
            .len()
            .checked_sub(depth as usize + 1)
            .ok_or(ExecError::BranchDepth(depth))?;
        let label = labels[idx];
        self.stack.unwind(label.height, label.arity)?;
        labels.truncate(idx);
        Ok(label.target)
    }
}

/// Evaluate a constant expression (a global initializer or segment offset) to its single value.
pub(crate) fn eval_const(
    expr: &Expr,
    store: &Rc<Store>,
    config: &Config,
) -> Result<Value, ExecError> {
    let code = compile(expr, &store.types)?;
    let mut stack = ValueStack::new();
    let frame = Frame::new(code.into(), Rc::clone(store), Vec::new(), 0, 1);
    Executor::new(&mut stack, config).drive(frame)?;
    stack.pop()
}

fn local(locals: &mut [LocalValue], idx: u32) -> Result<&mut LocalValue, ExecError> {
    locals
        .get_mut(idx as usize)
        .ok_or(ExecError::MissingLocal(idx))
}

fn effective_address(base: i32, offset: u32) -> u64 {
    base as u32 as u64 + offset as u64
}

fn compare(op: RelOp, a: i32, b: i32) -> bool {
    let (ua, ub) = (a as u32, b as u32);
    match op {
        RelOp::Eq => a == b,
        RelOp::Ne => a != b,
        RelOp::LtS => a < b,
        RelOp::LtU => ua < ub,
        RelOp::GtS => a > b,
        RelOp::GtU => ua > ub,
        RelOp::LeS => a <= b,
        RelOp::LeU => ua <= ub,
        RelOp::GeS => a >= b,
        RelOp::GeU => ua >= ub,
    }
}

fn unary(op: UnOp, a: i32) -> i32 {
    match op {
        UnOp::Clz => a.leading_zeros() as i32,
        UnOp::Ctz => a.trailing_zeros() as i32,
        UnOp::Popcnt => a.count_ones() as i32,
        UnOp::Extend8S => a as i8 as i32,
        UnOp::Extend16S => a as i16 as i32,
    }
}

fn binary(op: BinOp, a: i32, b: i32) -> Result<i32, ExecError> {
    let (ua, ub) = (a as u32, b as u32);
    Ok(match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::DivS => {
            if b == 0 {
                return Err(ExecError::DivisionByZero);
            }
            a.checked_div(b).ok_or(ExecError::IntegerOverflow)?
        }
        BinOp::DivU => ua.checked_div(ub).ok_or(ExecError::DivisionByZero)? as i32,
        BinOp::RemS => {
            if b == 0 {
                return Err(ExecError::DivisionByZero);
            }
            a.wrapping_rem(b)
        }
        BinOp::RemU => ua.checked_rem(ub).ok_or(ExecError::DivisionByZero)? as i32,
        BinOp::And => a & b,
        BinOp::Or => a | b,
        BinOp::Xor => a ^ b,
        BinOp::Shl => a.wrapping_shl(ub),
        BinOp::ShrS => a.wrapping_shr(ub),
        BinOp::ShrU => ua.wrapping_shr(ub) as i32,
        BinOp::Rotl => ua.rotate_left(ub % 32) as i32,
        BinOp::Rotr => ua.rotate_right(ub % 32) as i32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_division_edge_cases() {
        assert!(matches!(
            binary(BinOp::DivS, 1, 0),
            Err(ExecError::DivisionByZero)
        ));
        assert!(matches!(
            binary(BinOp::DivS, i32::MIN, -1),
            Err(ExecError::IntegerOverflow)
        ));
        assert_eq!(binary(BinOp::RemS, i32::MIN, -1).unwrap(), 0);
        assert_eq!(binary(BinOp::RemS, -7, 2).unwrap(), -1);
        assert_eq!(binary(BinOp::DivS, -7, 2).unwrap(), -3);
    }

    #[test]
    fn unsigned_ops_reinterpret_bits() {
        assert_eq!(binary(BinOp::DivU, -1, 2).unwrap(), i32::MAX);
        assert_eq!(binary(BinOp::RemU, -1, 16).unwrap(), 15);
        assert!(matches!(
            binary(BinOp::RemU, 5, 0),
            Err(ExecError::DivisionByZero)
        ));
        assert!(compare(RelOp::GtU, -1, 1));
        assert!(compare(RelOp::LtS, -1, 1));
    }

    #[test]
    fn shift_counts_wrap_at_32() {
        assert_eq!(binary(BinOp::Shl, 1, 33).unwrap(), 2);
        assert_eq!(binary(BinOp::ShrS, -8, 1).unwrap(), -4);
        assert_eq!(binary(BinOp::ShrU, -8, 28).unwrap(), 0xF);
        assert_eq!(binary(BinOp::Rotl, i32::MIN, 1).unwrap(), 1);
        assert_eq!(binary(BinOp::Rotr, 1, 1).unwrap(), i32::MIN);
    }

    #[test]
    fn add_wraps_around() {
        assert_eq!(binary(BinOp::Add, i32::MAX, 1).unwrap(), i32::MIN);
    }

    #[test]
    fn bit_counting_and_sign_extension() {
        assert_eq!(unary(UnOp::Clz, 1), 31);
        assert_eq!(unary(UnOp::Ctz, 0), 32);
        assert_eq!(unary(UnOp::Popcnt, -1), 32);
        assert_eq!(unary(UnOp::Extend8S, 0x80), -128);
        assert_eq!(unary(UnOp::Extend16S, 0x7FFF), 0x7FFF);
    }

    #[test]
    fn effective_address_does_not_wrap() {
        assert_eq!(effective_address(-1, 1), u32::MAX as u64 + 1);
    }

    #[test]
    fn const_expr_evaluates_to_one_value() {
        let store = Rc::new(Store::default());
        let value = eval_const(
            &vec![crate::core::Instruction::I32Const(-5)],
            &store,
            &Config::default(),
        )
        .unwrap();
        assert_eq!(value, Value::I32(-5));
    }

    #[test]
    fn const_expr_reading_a_missing_global_fails() {
        let store = Rc::new(Store::default());
        let err = eval_const(
            &vec![crate::core::Instruction::GlobalGet(
                crate::core::indices::GlobalIdx(0),
            )],
            &store,
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExecError::MissingGlobal(0)));
    }
}
