use crate::exec::ExecError;
use crate::runtime::value::Value;

/// The operand stack. Values are pushed and popped at the top; the stack is shared by every
/// frame of a call so callers hand arguments to callees through it.
#[derive(Debug, Default)]
pub struct ValueStack {
    values: Vec<Value>,
}

impl ValueStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    pub fn pop(&mut self) -> Result<Value, ExecError> {
        self.values.pop().ok_or(ExecError::StackUnderflow)
    }

    pub fn pop_i32(&mut self) -> Result<i32, ExecError> {
        match self.pop()? {
            Value::I32(n) => Ok(n),
            other => Err(ExecError::TypeMismatch {
                expected: crate::core::types::ValType::I32,
                actual: other.ty(),
            }),
        }
    }

    /// Pop `n` values, returned in the order they were pushed.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, ExecError> {
        let split = self
            .values
            .len()
            .checked_sub(n)
            .ok_or(ExecError::StackUnderflow)?;
        Ok(self.values.split_off(split))
    }

    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }

    pub(crate) fn truncate(&mut self, height: usize) {
        self.values.truncate(height);
    }

    /// Drop everything above `height` except the top `arity` values, which are moved down to
    /// sit directly on `height`.
    pub(crate) fn unwind(&mut self, height: usize, arity: usize) -> Result<(), ExecError> {
        let kept = self.pop_n(arity)?;
        if self.values.len() < height {
            return Err(ExecError::StackUnderflow);
        }
        self.values.truncate(height);
        self.values.extend(kept);
        Ok(())
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_n_keeps_push_order() {
        let mut stack = ValueStack::new();
        stack.push(1);
        stack.push(2);
        stack.push(3);
        assert_eq!(stack.pop_n(2).unwrap(), [Value::I32(2), Value::I32(3)]);
        assert_eq!(stack.as_slice(), [Value::I32(1)]);
    }

    #[test]
    fn popping_an_empty_stack_underflows() {
        let mut stack = ValueStack::new();
        assert!(matches!(stack.pop(), Err(ExecError::StackUnderflow)));
        stack.push(1);
        assert!(matches!(stack.pop_n(2), Err(ExecError::StackUnderflow)));
    }

    #[test]
    fn pop_i32_checks_the_type() {
        let mut stack = ValueStack::new();
        stack.push(Value::I64(5));
        assert!(matches!(
            stack.pop_i32(),
            Err(ExecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn unwind_moves_results_down() {
        let mut stack = ValueStack::new();
        for n in [10, 20, 30, 40] {
            stack.push(n);
        }
        stack.unwind(1, 1).unwrap();
        assert_eq!(stack.as_slice(), [Value::I32(10), Value::I32(40)]);

        stack.unwind(0, 0).unwrap();
        assert!(stack.is_empty());
    }
}
