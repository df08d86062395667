use crate::core::types::{FuncType, ValType};
use thiserror::Error;

/// A fatal error raised while running WebAssembly code or touching runtime state. Execution is
/// never resumed after one of these; the error propagates to the embedder.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("unreachable executed")]
    Unreachable,

    #[error("branch error: label {0} does not refer to an enclosing block")]
    BranchDepth(u32),

    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("type mismatch: expected {expected}; got {actual}")]
    TypeMismatch { expected: ValType, actual: ValType },

    #[error("unsupported value type: {0}")]
    UnsupportedType(ValType),

    #[error("integer divide by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("cannot set immutable global")]
    ImmutableGlobal,

    #[error("global is already initialized")]
    GlobalAlreadyInitialized,

    #[error("global read before initialization")]
    GlobalUninitialized,

    #[error("out of bounds memory access: {len} bytes at {addr} in memory of {size} bytes")]
    MemoryOutOfBounds { addr: u64, len: usize, size: usize },

    #[error("memory of {0} pages exceeds the limit of 65536 pages")]
    MemoryTooLarge(u32),

    #[error("out of bounds table access: element {index} in table of {size} elements")]
    TableOutOfBounds { index: u32, size: u32 },

    #[error("uninitialized table element {0}")]
    UninitializedElement(u32),

    #[error("unknown memory {0}")]
    MissingMemory(u32),

    #[error("unknown table {0}")]
    MissingTable(u32),

    #[error("unknown function {0}")]
    MissingFunction(u32),

    #[error("unknown global {0}")]
    MissingGlobal(u32),

    #[error("unknown local {0}")]
    MissingLocal(u32),

    #[error("unknown type {0}")]
    MissingType(u32),

    #[error("indirect call type mismatch: expected {expected}; got {actual}")]
    IndirectCallTypeMismatch { expected: FuncType, actual: FuncType },

    #[error("host function has no type and none was supplied by the call site")]
    UntypedHostFunction,

    #[error("host function returned {actual} values; expected {expected}")]
    HostResultArity { expected: usize, actual: usize },

    #[error("function belongs to an instance that no longer exists")]
    InstanceDropped,

    #[error("call stack exhausted")]
    CallStackExhausted,

    #[error("fuel exhausted")]
    FuelExhausted,

    #[error("host error: {0}")]
    Host(String),
}
