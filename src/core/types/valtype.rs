use super::numtype::NumType;
use super::reftype::RefType;
use std::fmt;

/// Value types classify the individual values that WebAssembly code can compute with and
/// the values that a variable accepts. They are either number types or reference types.
///
/// <https://www.w3.org/TR/wasm-core-2/#value-types>
/// <https://www.w3.org/TR/wasm-core-2/#binary-valtype>
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum ValType {
    Num(NumType),
    Ref(RefType),
}

impl ValType {
    pub const I32: ValType = ValType::Num(NumType::Int32);
    pub const I64: ValType = ValType::Num(NumType::Int64);
    pub const F32: ValType = ValType::Num(NumType::Float32);
    pub const F64: ValType = ValType::Num(NumType::Float64);
    pub const FUNCREF: ValType = ValType::Ref(RefType::Func);
    pub const EXTERNREF: ValType = ValType::Ref(RefType::Extern);
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValType::Num(NumType::Int32) => "i32",
            ValType::Num(NumType::Int64) => "i64",
            ValType::Num(NumType::Float32) => "f32",
            ValType::Num(NumType::Float64) => "f64",
            ValType::Ref(RefType::Func) => "funcref",
            ValType::Ref(RefType::Extern) => "externref",
        })
    }
}
