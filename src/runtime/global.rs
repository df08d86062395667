use crate::core::Expr;
use crate::core::types::{GlobalType, Mut, ValType};
use crate::exec::ExecError;
use crate::runtime::local::{check_supported, check_type};
use crate::runtime::stack::ValueStack;
use crate::runtime::value::Value;

/// A global variable. Globals created by the host start out initialized; globals declared by a
/// module carry their initializer expression until it is evaluated, exactly once, during
/// instantiation.
#[derive(Debug)]
pub struct GlobalValue {
    ty: GlobalType,
    value: Value,
    init: Option<Expr>,
    initialized: bool,
}

impl GlobalValue {
    /// A host-side global holding `value`.
    pub fn new(mutability: Mut, value: Value) -> Self {
        GlobalValue {
            ty: GlobalType(mutability, value.ty()),
            value,
            init: None,
            initialized: true,
        }
    }

    pub(crate) fn declared(ty: GlobalType, init: Expr) -> Self {
        GlobalValue {
            ty,
            value: Value::default_for(ty.1),
            init: Some(init),
            initialized: false,
        }
    }

    pub fn ty(&self) -> GlobalType {
        self.ty
    }

    pub fn value_type(&self) -> ValType {
        self.ty.1
    }

    pub fn is_mutable(&self) -> bool {
        self.ty.0 == Mut::Var
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Overwrite the value. Fails for immutable globals and for values of the wrong type.
    pub fn set(&mut self, value: Value) -> Result<(), ExecError> {
        if !self.is_mutable() {
            return Err(ExecError::ImmutableGlobal);
        }
        check_type(self.ty.1, &value)?;
        self.value = value;
        Ok(())
    }

    /// The initializer expression, as long as it has not been evaluated yet.
    pub(crate) fn initializer(&self) -> Result<&Expr, ExecError> {
        match &self.init {
            Some(init) if !self.initialized => Ok(init),
            _ => Err(ExecError::GlobalAlreadyInitialized),
        }
    }

    /// Store the evaluated initializer. A global is initialized at most once.
    pub(crate) fn initialize(&mut self, value: Value) -> Result<(), ExecError> {
        if self.initialized || self.init.is_none() {
            return Err(ExecError::GlobalAlreadyInitialized);
        }
        check_type(self.ty.1, &value)?;
        self.value = value;
        self.init = None;
        self.initialized = true;
        Ok(())
    }

    pub(crate) fn push_to(&self, stack: &mut ValueStack) -> Result<(), ExecError> {
        if !self.initialized {
            return Err(ExecError::GlobalUninitialized);
        }
        check_supported(self.ty.1)?;
        stack.push(self.value.clone());
        Ok(())
    }

    pub(crate) fn pop_from(&mut self, stack: &mut ValueStack) -> Result<(), ExecError> {
        check_supported(self.ty.1)?;
        let value = stack.pop()?;
        self.set(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Instruction;

    #[test]
    fn immutable_globals_reject_writes() {
        let mut g = GlobalValue::new(Mut::Const, Value::I32(1));
        assert!(matches!(g.set(Value::I32(2)), Err(ExecError::ImmutableGlobal)));
        assert_eq!(g.value(), &Value::I32(1));
    }

    #[test]
    fn mutable_globals_check_the_value_type() {
        let mut g = GlobalValue::new(Mut::Var, Value::I32(1));
        g.set(Value::I32(5)).unwrap();
        assert_eq!(g.value(), &Value::I32(5));
        assert!(matches!(
            g.set(Value::ExternRef(None)),
            Err(ExecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn initializer_runs_exactly_once() {
        let mut g = GlobalValue::declared(
            GlobalType(Mut::Const, ValType::I32),
            vec![Instruction::I32Const(9)],
        );

        let mut stack = ValueStack::new();
        assert!(matches!(
            g.push_to(&mut stack),
            Err(ExecError::GlobalUninitialized)
        ));

        assert_eq!(g.initializer().unwrap(), &vec![Instruction::I32Const(9)]);
        g.initialize(Value::I32(9)).unwrap();
        assert_eq!(g.value(), &Value::I32(9));

        assert!(matches!(
            g.initializer(),
            Err(ExecError::GlobalAlreadyInitialized)
        ));
        let again = g.initialize(Value::I32(10));
        assert!(matches!(again, Err(ExecError::GlobalAlreadyInitialized)));
        assert_eq!(g.value(), &Value::I32(9));
    }

    #[test]
    fn host_globals_have_no_initializer() {
        let mut g = GlobalValue::new(Mut::Var, Value::I32(3));
        assert!(matches!(
            g.initialize(Value::I32(4)),
            Err(ExecError::GlobalAlreadyInitialized)
        ));
    }

    #[test]
    fn global_set_pops_from_the_stack() {
        let mut g = GlobalValue::new(Mut::Var, Value::I32(0));
        let mut stack = ValueStack::new();
        stack.push(42);
        g.pop_from(&mut stack).unwrap();
        g.push_to(&mut stack).unwrap();
        assert_eq!(stack.pop_i32().unwrap(), 42);
    }
}
