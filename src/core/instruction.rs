//! WebAssembly instruction representation.
//!
//! Defined in <https://www.w3.org/TR/wasm-core-2/#instructions>
use super::indices::*;
use super::types::{RefType, ValType};

/// An instruction sequence terminated by the `end` marker. The marker itself is implied and
/// not stored.
pub type Expr = Vec<Instruction>;

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // --- Control instructions (5.4.1) ---
    Unreachable,
    Nop,
    Block(BlockType, Expr),
    Loop(BlockType, Expr),
    /// The else arm is `None` when the binary had no `else` marker at all, and `Some(vec![])`
    /// when the marker was present with an empty arm. Both shapes must survive re-encoding.
    If(BlockType, Expr, Option<Expr>),
    Br(LabelIdx),
    BrIf(LabelIdx),
    BrTable(Vec<LabelIdx>, LabelIdx),
    Return,
    Call(FuncIdx),
    CallIndirect(TableIdx, TypeIdx),

    // --- Reference instructions (5.4.2) ---
    RefNull(RefType),
    RefIsNull,
    RefFunc(FuncIdx),

    // --- Parametric instructions (5.4.3) ---
    Drop,
    Select(Option<Vec<ValType>>),

    // --- Variable instructions (5.4.4) ---
    LocalGet(LocalIdx),
    LocalSet(LocalIdx),
    LocalTee(LocalIdx),
    GlobalGet(GlobalIdx),
    GlobalSet(GlobalIdx),

    // --- Memory instructions (5.4.6) ---
    I32Load(Memarg),
    I64Load(Memarg),
    F32Load(Memarg),
    F64Load(Memarg),
    I32Load8s(Memarg),
    I32Load8u(Memarg),
    I32Load16s(Memarg),
    I32Load16u(Memarg),
    I32Store(Memarg),
    I64Store(Memarg),
    F32Store(Memarg),
    F64Store(Memarg),
    I32Store8(Memarg),
    I32Store16(Memarg),
    MemorySize,
    MemoryGrow,

    // --- Numeric instructions (5.4.7) ---
    I32Const(i32),
    I64Const(i64),
    F32Const(f32),
    F64Const(f64),
    I32Eqz,
    I32Eq,
    I32Ne,
    I32LtS,
    I32LtU,
    I32GtS,
    I32GtU,
    I32LeS,
    I32LeU,
    I32GeS,
    I32GeU,
    I32Clz,
    I32Ctz,
    I32Popcnt,
    I32Add,
    I32Sub,
    I32Mul,
    I32DivS,
    I32DivU,
    I32RemS,
    I32RemU,
    I32And,
    I32Or,
    I32Xor,
    I32Shl,
    I32ShrS,
    I32ShrU,
    I32Rotl,
    I32Rotr,
    I32Extend8S,
    I32Extend16S,
}

/// A structured instruction's block type classifies its parameters and results.
///
/// <https://www.w3.org/TR/wasm-core-2/#binary-blocktype>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Empty,
    Value(ValType),
    Type(TypeIdx),
}

/// Immediate of every load and store instruction. The alignment is a hint and is not enforced
/// during execution.
///
/// <https://www.w3.org/TR/wasm-core-2/#binary-memarg>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Memarg {
    pub align: u32,
    pub offset: u32,
}
