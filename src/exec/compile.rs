//! Lowering of structured function bodies into a flat op array.
//!
//! Every `block`, `loop` and `if` is emitted in place, followed by its body and a closing
//! [`Op::End`]. The positions a branch can reach are resolved here, once per function, so the
//! interpreter never has to search for the end of a construct at run time. Nested bodies are
//! walked with an explicit work list, so the depth of a body never reaches the call stack.
use crate::core::types::{FuncType, RefType, ValType};
use crate::core::{BlockType, Expr, Instruction};
use crate::exec::ExecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadKind {
    I32,
    I32_8S,
    I32_8U,
    I32_16S,
    I32_16U,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StoreKind {
    I32,
    I32_8,
    I32_16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelOp {
    Eq,
    Ne,
    LtS,
    LtU,
    GtS,
    GtU,
    LeS,
    LeU,
    GeS,
    GeU,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnOp {
    Clz,
    Ctz,
    Popcnt,
    Extend8S,
    Extend16S,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    DivS,
    DivU,
    RemS,
    RemU,
    And,
    Or,
    Xor,
    Shl,
    ShrS,
    ShrU,
    Rotl,
    Rotr,
}

/// One executable step. `end` and `else_` fields hold op indices within the same function.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Op {
    Unreachable,
    Nop,
    Block {
        params: usize,
        results: usize,
        end: usize,
    },
    Loop {
        params: usize,
    },
    If {
        params: usize,
        results: usize,
        else_: Option<usize>,
        end: usize,
    },
    Else {
        end: usize,
    },
    End,
    Br(u32),
    BrIf(u32),
    BrTable {
        labels: Box<[u32]>,
        default: u32,
    },
    Return,
    Call(u32),
    CallIndirect {
        table: u32,
        ty: u32,
    },

    RefNull(RefType),
    RefIsNull,
    RefFunc(u32),

    Drop,
    Select,

    LocalGet(u32),
    LocalSet(u32),
    LocalTee(u32),
    GlobalGet(u32),
    GlobalSet(u32),

    Load(LoadKind, u32),
    Store(StoreKind, u32),
    MemorySize,
    MemoryGrow,

    I32Const(i32),
    I32Eqz,
    I32Rel(RelOp),
    I32Unary(UnOp),
    I32Binary(BinOp),

    /// An instruction over a number type the engine does not execute.
    Unsupported(ValType),
}

struct Compiler<'a> {
    ops: Vec<Op>,
    types: &'a [FuncType],
}

/// Work left for the compiler. Structured instructions queue their bodies here, followed by the
/// op that closes them.
enum Pending<'b> {
    Seq(std::slice::Iter<'b, Instruction>),
    /// Emit the `else` of the `if` at the given op index, then its second arm.
    Else { at: usize, body: &'b Expr },
    /// Emit the `end` of the construct opened at the given op index and patch its target.
    End { at: usize },
}

/// Compile a function body or constant expression. The result always ends with the [`Op::End`]
/// closing the outermost label.
pub(crate) fn compile(body: &Expr, types: &[FuncType]) -> Result<Vec<Op>, ExecError> {
    let mut compiler = Compiler {
        ops: Vec::new(),
        types,
    };
    compiler.emit_body(body)?;
    compiler.ops.push(Op::End);
    Ok(compiler.ops)
}

impl Compiler<'_> {
    fn block_arity(&self, bt: &BlockType) -> Result<(usize, usize), ExecError> {
        Ok(match bt {
            BlockType::Empty => (0, 0),
            BlockType::Value(_) => (0, 1),
            BlockType::Type(idx) => {
                let ty = self
                    .types
                    .get(idx.index())
                    .ok_or(ExecError::MissingType(idx.0))?;
                (ty.parameters.len(), ty.results.len())
            }
        })
    }

    fn emit_body<'b>(&mut self, body: &'b Expr) -> Result<(), ExecError> {
        let mut pending = vec![Pending::Seq(body.iter())];
        while let Some(top) = pending.pop() {
            match top {
                Pending::Seq(mut rest) => {
                    if let Some(ins) = rest.next() {
                        pending.push(Pending::Seq(rest));
                        self.emit(ins, &mut pending)?;
                    }
                }
                Pending::Else { at, body } => {
                    let else_at = self.ops.len();
                    self.ops.push(Op::Else { end: 0 });
                    if let Op::If { else_, .. } = &mut self.ops[at] {
                        *else_ = Some(else_at);
                    }
                    pending.push(Pending::Seq(body.iter()));
                }
                Pending::End { at } => self.close(at),
            }
        }
        Ok(())
    }

    fn close(&mut self, at: usize) {
        let end = self.ops.len();
        self.ops.push(Op::End);

        let mut else_at = None;
        match &mut self.ops[at] {
            Op::Block { end: target, .. } => *target = end,
            Op::If {
                end: target, else_, ..
            } => {
                *target = end;
                else_at = *else_;
            }
            _ => {}
        }
        if let Some(else_at) = else_at {
            self.ops[else_at] = Op::Else { end };
        }
    }

    fn emit<'b>(
        &mut self,
        ins: &'b Instruction,
        pending: &mut Vec<Pending<'b>>,
    ) -> Result<(), ExecError> {
        use Instruction as I;

        let at = self.ops.len();
        let op = match ins {
            I::Block(bt, body) => {
                let (params, results) = self.block_arity(bt)?;
                self.ops.push(Op::Block {
                    params,
                    results,
                    end: 0,
                });
                pending.push(Pending::End { at });
                pending.push(Pending::Seq(body.iter()));
                return Ok(());
            }
            I::Loop(bt, body) => {
                let (params, _) = self.block_arity(bt)?;
                self.ops.push(Op::Loop { params });
                pending.push(Pending::End { at });
                pending.push(Pending::Seq(body.iter()));
                return Ok(());
            }
            I::If(bt, then, otherwise) => {
                let (params, results) = self.block_arity(bt)?;
                self.ops.push(Op::If {
                    params,
                    results,
                    else_: None,
                    end: 0,
                });
                pending.push(Pending::End { at });
                if let Some(otherwise) = otherwise {
                    pending.push(Pending::Else {
                        at,
                        body: otherwise,
                    });
                }
                pending.push(Pending::Seq(then.iter()));
                return Ok(());
            }

            I::Unreachable => Op::Unreachable,
            I::Nop => Op::Nop,
            I::Br(l) => Op::Br(l.0),
            I::BrIf(l) => Op::BrIf(l.0),
            I::BrTable(labels, default) => Op::BrTable {
                labels: labels.iter().map(|l| l.0).collect(),
                default: default.0,
            },
            I::Return => Op::Return,
            I::Call(f) => Op::Call(f.0),
            I::CallIndirect(table, ty) => Op::CallIndirect {
                table: table.0,
                ty: ty.0,
            },

            I::RefNull(t) => Op::RefNull(*t),
            I::RefIsNull => Op::RefIsNull,
            I::RefFunc(f) => Op::RefFunc(f.0),

            I::Drop => Op::Drop,
            I::Select(_) => Op::Select,

            I::LocalGet(x) => Op::LocalGet(x.0),
            I::LocalSet(x) => Op::LocalSet(x.0),
            I::LocalTee(x) => Op::LocalTee(x.0),
            I::GlobalGet(x) => Op::GlobalGet(x.0),
            I::GlobalSet(x) => Op::GlobalSet(x.0),

            I::I32Load(m) => Op::Load(LoadKind::I32, m.offset),
            I::I32Load8s(m) => Op::Load(LoadKind::I32_8S, m.offset),
            I::I32Load8u(m) => Op::Load(LoadKind::I32_8U, m.offset),
            I::I32Load16s(m) => Op::Load(LoadKind::I32_16S, m.offset),
            I::I32Load16u(m) => Op::Load(LoadKind::I32_16U, m.offset),
            I::I32Store(m) => Op::Store(StoreKind::I32, m.offset),
            I::I32Store8(m) => Op::Store(StoreKind::I32_8, m.offset),
            I::I32Store16(m) => Op::Store(StoreKind::I32_16, m.offset),
            I::I64Load(_) | I::I64Store(_) | I::I64Const(_) => Op::Unsupported(ValType::I64),
            I::F32Load(_) | I::F32Store(_) | I::F32Const(_) => Op::Unsupported(ValType::F32),
            I::F64Load(_) | I::F64Store(_) | I::F64Const(_) => Op::Unsupported(ValType::F64),
            I::MemorySize => Op::MemorySize,
            I::MemoryGrow => Op::MemoryGrow,

            I::I32Const(n) => Op::I32Const(*n),
            I::I32Eqz => Op::I32Eqz,
            I::I32Eq => Op::I32Rel(RelOp::Eq),
            I::I32Ne => Op::I32Rel(RelOp::Ne),
            I::I32LtS => Op::I32Rel(RelOp::LtS),
            I::I32LtU => Op::I32Rel(RelOp::LtU),
            I::I32GtS => Op::I32Rel(RelOp::GtS),
            I::I32GtU => Op::I32Rel(RelOp::GtU),
            I::I32LeS => Op::I32Rel(RelOp::LeS),
            I::I32LeU => Op::I32Rel(RelOp::LeU),
            I::I32GeS => Op::I32Rel(RelOp::GeS),
            I::I32GeU => Op::I32Rel(RelOp::GeU),

            I::I32Clz => Op::I32Unary(UnOp::Clz),
            I::I32Ctz => Op::I32Unary(UnOp::Ctz),
            I::I32Popcnt => Op::I32Unary(UnOp::Popcnt),
            I::I32Extend8S => Op::I32Unary(UnOp::Extend8S),
            I::I32Extend16S => Op::I32Unary(UnOp::Extend16S),

            I::I32Add => Op::I32Binary(BinOp::Add),
            I::I32Sub => Op::I32Binary(BinOp::Sub),
            I::I32Mul => Op::I32Binary(BinOp::Mul),
            I::I32DivS => Op::I32Binary(BinOp::DivS),
            I::I32DivU => Op::I32Binary(BinOp::DivU),
            I::I32RemS => Op::I32Binary(BinOp::RemS),
            I::I32RemU => Op::I32Binary(BinOp::RemU),
            I::I32And => Op::I32Binary(BinOp::And),
            I::I32Or => Op::I32Binary(BinOp::Or),
            I::I32Xor => Op::I32Binary(BinOp::Xor),
            I::I32Shl => Op::I32Binary(BinOp::Shl),
            I::I32ShrS => Op::I32Binary(BinOp::ShrS),
            I::I32ShrU => Op::I32Binary(BinOp::ShrU),
            I::I32Rotl => Op::I32Binary(BinOp::Rotl),
            I::I32Rotr => Op::I32Binary(BinOp::Rotr),
        };

        self.ops.push(op);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::indices::{LabelIdx, TypeIdx};

    #[test]
    fn block_records_its_end() {
        let body = vec![Instruction::Block(
            BlockType::Value(ValType::I32),
            vec![Instruction::I32Const(1), Instruction::Br(LabelIdx(0))],
        )];
        let ops = compile(&body, &[]).unwrap();
        assert_eq!(
            ops,
            [
                Op::Block {
                    params: 0,
                    results: 1,
                    end: 3
                },
                Op::I32Const(1),
                Op::Br(0),
                Op::End,
                Op::End,
            ]
        );
    }

    #[test]
    fn if_else_points_both_arms_at_the_shared_end() {
        let body = vec![Instruction::If(
            BlockType::Empty,
            vec![Instruction::Nop],
            Some(vec![Instruction::Drop, Instruction::Nop]),
        )];
        let ops = compile(&body, &[]).unwrap();
        assert_eq!(
            ops[0],
            Op::If {
                params: 0,
                results: 0,
                else_: Some(2),
                end: 5
            }
        );
        assert_eq!(ops[2], Op::Else { end: 5 });
        assert_eq!(ops[5], Op::End);
    }

    #[test]
    fn loop_takes_params_from_its_type() {
        let types = [FuncType::new([ValType::I32, ValType::I32], [ValType::I32])];
        let body = vec![Instruction::Loop(BlockType::Type(TypeIdx(0)), vec![])];
        let ops = compile(&body, &types).unwrap();
        assert_eq!(ops[0], Op::Loop { params: 2 });
    }

    #[test]
    fn unknown_block_type_fails() {
        let body = vec![Instruction::Block(BlockType::Type(TypeIdx(4)), vec![])];
        assert!(matches!(
            compile(&body, &[]),
            Err(ExecError::MissingType(4))
        ));
    }

    #[test]
    fn deeply_nested_blocks_close_in_reverse_order() {
        let depth = crate::decode::instructions::MAX_NESTING_DEPTH;
        let mut body = vec![Instruction::Nop];
        for _ in 0..depth {
            body = vec![Instruction::Block(BlockType::Empty, body)];
        }
        let ops = compile(&body, &[]).unwrap();
        assert_eq!(ops.len(), 2 * depth + 2);
        assert_eq!(ops[depth], Op::Nop);
        for level in 0..depth {
            assert_eq!(
                ops[level],
                Op::Block {
                    params: 0,
                    results: 0,
                    end: 2 * depth - level
                }
            );
        }
    }

    #[test]
    fn reserved_number_types_compile_to_unsupported() {
        let ops = compile(&vec![Instruction::F64Const(1.5)], &[]).unwrap();
        assert_eq!(ops[0], Op::Unsupported(ValType::F64));
    }
}
