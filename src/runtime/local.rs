use crate::core::types::{NumType, ValType};
use crate::exec::ExecError;
use crate::runtime::stack::ValueStack;
use crate::runtime::value::Value;

/// Only i32 and reference values move between variables and the operand stack; the other
/// number types have a representation but no execution support.
pub(crate) fn check_supported(ty: ValType) -> Result<(), ExecError> {
    match ty {
        ValType::Num(NumType::Int32) | ValType::Ref(_) => Ok(()),
        other => Err(ExecError::UnsupportedType(other)),
    }
}

pub(crate) fn check_type(expected: ValType, value: &Value) -> Result<(), ExecError> {
    let actual = value.ty();
    if actual != expected {
        return Err(ExecError::TypeMismatch { expected, actual });
    }
    Ok(())
}

/// A typed local variable slot of a running function.
#[derive(Debug, Clone)]
pub struct LocalValue {
    ty: ValType,
    value: Value,
}

impl LocalValue {
    /// A zero-initialized local.
    pub fn new(ty: ValType) -> Self {
        LocalValue {
            ty,
            value: Value::default_for(ty),
        }
    }

    pub(crate) fn with_value(ty: ValType, value: Value) -> Result<Self, ExecError> {
        check_type(ty, &value)?;
        Ok(LocalValue { ty, value })
    }

    pub fn ty(&self) -> ValType {
        self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Push the current value onto `stack`.
    pub fn push_to(&self, stack: &mut ValueStack) -> Result<(), ExecError> {
        check_supported(self.ty)?;
        stack.push(self.value.clone());
        Ok(())
    }

    /// Pop a value of this local's type off `stack` into the slot.
    pub fn pop_from(&mut self, stack: &mut ValueStack) -> Result<(), ExecError> {
        check_supported(self.ty)?;
        let value = stack.pop()?;
        check_type(self.ty, &value)?;
        self.value = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i32_local_round_trips_through_the_stack() {
        let mut stack = ValueStack::new();
        let mut local = LocalValue::new(ValType::I32);
        assert_eq!(local.value(), &Value::I32(0));

        stack.push(7);
        local.pop_from(&mut stack).unwrap();
        assert!(stack.is_empty());

        local.push_to(&mut stack).unwrap();
        assert_eq!(stack.pop_i32().unwrap(), 7);
    }

    #[test]
    fn reserved_number_types_are_unsupported() {
        let mut stack = ValueStack::new();
        for ty in [ValType::I64, ValType::F32, ValType::F64] {
            let local = LocalValue::new(ty);
            assert!(matches!(
                local.push_to(&mut stack),
                Err(ExecError::UnsupportedType(t)) if t == ty
            ));
        }
    }

    #[test]
    fn pop_from_rejects_the_wrong_type() {
        let mut stack = ValueStack::new();
        stack.push(Value::FuncRef(None));
        let mut local = LocalValue::new(ValType::I32);
        assert!(matches!(
            local.pop_from(&mut stack),
            Err(ExecError::TypeMismatch { .. })
        ));
    }
}
