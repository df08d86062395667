use crate::core::types::{NumType, RefType, ValType};
use crate::runtime::func::FuncRef;
use std::fmt;
use std::rc::Rc;

/// A single WebAssembly value. Integers are stored as raw two's-complement words; signedness is
/// a property of the instruction that consumes them.
#[derive(Clone)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    FuncRef(Option<FuncRef>),
    /// An opaque host reference, identified by a host-chosen number.
    ExternRef(Option<u32>),
}

impl Value {
    pub fn ty(&self) -> ValType {
        match self {
            Value::I32(_) => ValType::I32,
            Value::I64(_) => ValType::I64,
            Value::F32(_) => ValType::F32,
            Value::F64(_) => ValType::F64,
            Value::FuncRef(_) => ValType::FUNCREF,
            Value::ExternRef(_) => ValType::EXTERNREF,
        }
    }

    /// The zero value locals of type `ty` start with.
    pub fn default_for(ty: ValType) -> Value {
        match ty {
            ValType::Num(NumType::Int32) => Value::I32(0),
            ValType::Num(NumType::Int64) => Value::I64(0),
            ValType::Num(NumType::Float32) => Value::F32(0.0),
            ValType::Num(NumType::Float64) => Value::F64(0.0),
            ValType::Ref(RefType::Func) => Value::FuncRef(None),
            ValType::Ref(RefType::Extern) => Value::ExternRef(None),
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null_ref(&self) -> bool {
        matches!(self, Value::FuncRef(None) | Value::ExternRef(None))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::I32(n)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            // bitwise, so that NaNs compare equal to themselves
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::FuncRef(a), Value::FuncRef(b)) => match (a, b) {
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            },
            (Value::ExternRef(a), Value::ExternRef(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(n) => write!(f, "i32:{n}"),
            Value::I64(n) => write!(f, "i64:{n}"),
            Value::F32(z) => write!(f, "f32:{z}"),
            Value::F64(z) => write!(f, "f64:{z}"),
            Value::FuncRef(None) => f.write_str("funcref:null"),
            Value::FuncRef(Some(func)) => write!(f, "funcref:{:p}", Rc::as_ptr(func)),
            Value::ExternRef(None) => f.write_str("externref:null"),
            Value::ExternRef(Some(n)) => write!(f, "externref:{n}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(n) => write!(f, "{n}"),
            Value::I64(n) => write!(f, "{n}"),
            Value::F32(z) => write!(f, "{z}"),
            Value::F64(z) => write!(f, "{z}"),
            other => write!(f, "{other:?}"),
        }
    }
}
