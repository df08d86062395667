//! WebAssembly instruction decoding.
//!
//! Defined in <https://www.w3.org/TR/wasm-core-2/#binary-instr>
use crate::core::indices::*;
use crate::core::instruction::{BlockType, Expr, Instruction, Memarg};
use crate::core::types::{RefType, ValType};
use crate::decode::helpers::{decode_f32, decode_f64, decode_list};
use crate::decode::helpers::{DecodeFloat32Error, DecodeFloat64Error, DecodeListError};
use crate::decode::indices::DecodeIndexError;
use crate::decode::integer::{DecodeIntegerError, decode_i32, decode_i64, decode_s33, decode_u32};
use crate::decode::types::{DecodeRefTypeError, DecodeValTypeError};
use crate::decode::{FromMarkerByte, read_byte};
use log::trace;
use std::io::{self, Read};
use thiserror::Error;

/// Deepest nesting of `block`, `loop` and `if` accepted within one expression.
pub const MAX_NESTING_DEPTH: usize = 1024;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed reading instruction opcode")]
    ReadOpcode(#[from] io::Error),

    #[error("failed decoding control instruction")]
    Control(#[from] ControlError),

    #[error("failed decoding reference instruction")]
    Reference(#[from] ReferenceError),

    #[error("failed decoding parametric instruction")]
    Parametric(#[from] ParametricError),

    #[error("failed decoding variable instruction")]
    Variable(#[from] VariableError),

    #[error("failed decoding memory instruction")]
    Memory(#[from] MemoryError),

    #[error("failed decoding numeric instruction")]
    Numeric(#[from] NumericError),

    #[error("invalid opcode: {0:#04X}")]
    InvalidOpcode(u8),
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("failed decoding block type")]
    BlockType(#[from] BlockTypeError),

    #[error(transparent)]
    Index(#[from] DecodeIndexError),

    #[error("failed decoding label table")]
    LabelTable(#[from] DecodeListError<DecodeIndexError>),

    #[error("unexpected `else` outside of an `if` body")]
    UnexpectedElse,

    #[error("structured instructions nested deeper than {MAX_NESTING_DEPTH} levels")]
    NestingTooDeep,
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("failed decoding reference type")]
    RefType(#[from] DecodeRefTypeError),

    #[error(transparent)]
    FuncIdx(#[from] DecodeIndexError),
}

#[derive(Debug, Error)]
pub enum ParametricError {
    #[error("failed decoding value type vector")]
    DecodeVector(#[from] DecodeListError<DecodeValTypeError>),
}

#[derive(Debug, Error)]
#[error("failed decoding variable index")]
pub struct VariableError(#[from] pub DecodeIndexError);

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("failed decoding memarg")]
    Memarg(#[from] MemargError),

    #[error("failed reading reserved byte")]
    ReadReservedByte(#[source] io::Error),

    #[error("unexpected reserved byte: expected 0x00; got {0:#04X}")]
    InvalidReservedByte(u8),
}

#[derive(Debug, Error)]
pub enum NumericError {
    #[error("failed decoding i32 immediate")]
    DecodeI32(#[source] DecodeIntegerError),

    #[error("failed decoding i64 immediate")]
    DecodeI64(#[source] DecodeIntegerError),

    #[error(transparent)]
    DecodeF32(#[from] DecodeFloat32Error),

    #[error(transparent)]
    DecodeF64(#[from] DecodeFloat64Error),
}

/// Outcome of parsing a single opcode. The `end` and `else` delimiters are not instructions of
/// their own; they terminate the enclosing instruction sequence.
#[derive(Debug)]
pub(crate) enum ParseResult {
    Instruction(Instruction),
    End,
    Else,
}

impl Instruction {
    /// Parse one instruction. A structured instruction is read up to its matching `end`,
    /// bodies included.
    pub(crate) fn parse<R: Read + ?Sized>(reader: &mut R) -> Result<ParseResult, ParseError> {
        Ok(match next_token(reader)? {
            Token::Instruction(ins) => ParseResult::Instruction(ins),
            Token::Open(opening) => ParseResult::Instruction(parse_structured(reader, opening)?),
            Token::End => ParseResult::End,
            Token::Else => ParseResult::Else,
        })
    }
}

/// The start of a structured instruction, before its body has been read.
#[derive(Debug, Clone, Copy)]
enum Opening {
    Block(BlockType),
    Loop(BlockType),
    If(BlockType),
}

#[derive(Debug)]
enum Token {
    Instruction(Instruction),
    Open(Opening),
    End,
    Else,
}

/// A structured instruction whose body is still being read. `then` holds the finished first
/// arm once an `if` has seen its `else`.
struct OpenBlock {
    opening: Opening,
    then: Option<Expr>,
    body: Expr,
}

impl OpenBlock {
    fn new(opening: Opening) -> Self {
        OpenBlock {
            opening,
            then: None,
            body: Vec::new(),
        }
    }

    fn begin_else(&mut self) -> Result<(), ControlError> {
        match (self.opening, &self.then) {
            (Opening::If(_), None) => {
                self.then = Some(std::mem::take(&mut self.body));
                Ok(())
            }
            _ => Err(ControlError::UnexpectedElse),
        }
    }

    fn finish(self) -> Instruction {
        match self.opening {
            Opening::Block(bt) => Instruction::Block(bt, self.body),
            Opening::Loop(bt) => Instruction::Loop(bt, self.body),
            Opening::If(bt) => match self.then {
                Some(then) => Instruction::If(bt, then, Some(self.body)),
                None => Instruction::If(bt, self.body, None),
            },
        }
    }
}

/// Read the body of a structured instruction, and of everything nested in it, up to the
/// matching `end`. Enclosing constructs wait on an explicit stack, so the nesting depth of the
/// input is bounded by [`MAX_NESTING_DEPTH`] and never by the call stack.
fn parse_structured<R: Read + ?Sized>(
    reader: &mut R,
    opening: Opening,
) -> Result<Instruction, ParseError> {
    let mut enclosing: Vec<OpenBlock> = Vec::new();
    let mut current = OpenBlock::new(opening);

    loop {
        match next_token(reader)? {
            Token::Instruction(ins) => current.body.push(ins),
            Token::Open(opening) => {
                if enclosing.len() + 1 >= MAX_NESTING_DEPTH {
                    return Err(ControlError::NestingTooDeep.into());
                }
                enclosing.push(std::mem::replace(&mut current, OpenBlock::new(opening)));
            }
            Token::Else => current.begin_else()?,
            Token::End => {
                let ins = current.finish();
                match enclosing.pop() {
                    Some(outer) => {
                        current = outer;
                        current.body.push(ins);
                    }
                    None => return Ok(ins),
                }
            }
        }
    }
}

fn block_type<R: Read + ?Sized>(reader: &mut R) -> Result<BlockType, ControlError> {
    Ok(BlockType::decode(reader)?)
}

/// Read a single opcode and its immediates.
fn next_token<R: Read + ?Sized>(reader: &mut R) -> Result<Token, ParseError> {
    let opcode = read_byte(reader)?;
    trace!("opcode {opcode:#04X}");

    let ins = match opcode {
        0x0B => return Ok(Token::End),
        0x05 => return Ok(Token::Else),

        // --- Control instructions ---
        0x00 => Instruction::Unreachable,
        0x01 => Instruction::Nop,
        0x02 => return Ok(Token::Open(Opening::Block(block_type(reader)?))),
        0x03 => return Ok(Token::Open(Opening::Loop(block_type(reader)?))),
        0x04 => return Ok(Token::Open(Opening::If(block_type(reader)?))),
        0x0C => Instruction::Br(LabelIdx::decode(reader).map_err(ControlError::from)?),
        0x0D => Instruction::BrIf(LabelIdx::decode(reader).map_err(ControlError::from)?),
        0x0E => {
            let labels = decode_list(reader, LabelIdx::decode).map_err(ControlError::from)?;
            let default = LabelIdx::decode(reader).map_err(ControlError::from)?;
            Instruction::BrTable(labels, default)
        }
        0x0F => Instruction::Return,
        0x10 => Instruction::Call(FuncIdx::decode(reader).map_err(ControlError::from)?),
        0x11 => {
            // the type index comes first in the binary, the table index second
            let y = TypeIdx::decode(reader).map_err(ControlError::from)?;
            let x = TableIdx::decode(reader).map_err(ControlError::from)?;
            Instruction::CallIndirect(x, y)
        }

        // --- Reference instructions ---
        0xD0 => Instruction::RefNull(RefType::decode(reader).map_err(ReferenceError::from)?),
        0xD1 => Instruction::RefIsNull,
        0xD2 => Instruction::RefFunc(FuncIdx::decode(reader).map_err(ReferenceError::from)?),

        // --- Parametric instructions ---
        0x1A => Instruction::Drop,
        0x1B => Instruction::Select(None),
        0x1C => Instruction::Select(Some(
            decode_list(reader, ValType::decode).map_err(ParametricError::from)?,
        )),

        // --- Variable instructions ---
        0x20 => Instruction::LocalGet(LocalIdx::decode(reader).map_err(VariableError)?),
        0x21 => Instruction::LocalSet(LocalIdx::decode(reader).map_err(VariableError)?),
        0x22 => Instruction::LocalTee(LocalIdx::decode(reader).map_err(VariableError)?),
        0x23 => Instruction::GlobalGet(GlobalIdx::decode(reader).map_err(VariableError)?),
        0x24 => Instruction::GlobalSet(GlobalIdx::decode(reader).map_err(VariableError)?),

        // --- Memory instructions ---
        op @ (0x28..=0x2F | 0x36..=0x3B) => {
            let m = Memarg::decode(reader).map_err(MemoryError::from)?;
            match op {
                0x28 => Instruction::I32Load(m),
                0x29 => Instruction::I64Load(m),
                0x2A => Instruction::F32Load(m),
                0x2B => Instruction::F64Load(m),
                0x2C => Instruction::I32Load8s(m),
                0x2D => Instruction::I32Load8u(m),
                0x2E => Instruction::I32Load16s(m),
                0x2F => Instruction::I32Load16u(m),
                0x36 => Instruction::I32Store(m),
                0x37 => Instruction::I64Store(m),
                0x38 => Instruction::F32Store(m),
                0x39 => Instruction::F64Store(m),
                0x3A => Instruction::I32Store8(m),
                _ => Instruction::I32Store16(m),
            }
        }
        0x3F => {
            expect_reserved_zero(reader)?;
            Instruction::MemorySize
        }
        0x40 => {
            expect_reserved_zero(reader)?;
            Instruction::MemoryGrow
        }

        // --- Numeric instructions ---
        0x41 => Instruction::I32Const(decode_i32(reader).map_err(NumericError::DecodeI32)?),
        0x42 => Instruction::I64Const(decode_i64(reader).map_err(NumericError::DecodeI64)?),
        0x43 => Instruction::F32Const(decode_f32(reader).map_err(NumericError::from)?),
        0x44 => Instruction::F64Const(decode_f64(reader).map_err(NumericError::from)?),

        0x45 => Instruction::I32Eqz,
        0x46 => Instruction::I32Eq,
        0x47 => Instruction::I32Ne,
        0x48 => Instruction::I32LtS,
        0x49 => Instruction::I32LtU,
        0x4A => Instruction::I32GtS,
        0x4B => Instruction::I32GtU,
        0x4C => Instruction::I32LeS,
        0x4D => Instruction::I32LeU,
        0x4E => Instruction::I32GeS,
        0x4F => Instruction::I32GeU,

        0x67 => Instruction::I32Clz,
        0x68 => Instruction::I32Ctz,
        0x69 => Instruction::I32Popcnt,
        0x6A => Instruction::I32Add,
        0x6B => Instruction::I32Sub,
        0x6C => Instruction::I32Mul,
        0x6D => Instruction::I32DivS,
        0x6E => Instruction::I32DivU,
        0x6F => Instruction::I32RemS,
        0x70 => Instruction::I32RemU,
        0x71 => Instruction::I32And,
        0x72 => Instruction::I32Or,
        0x73 => Instruction::I32Xor,
        0x74 => Instruction::I32Shl,
        0x75 => Instruction::I32ShrS,
        0x76 => Instruction::I32ShrU,
        0x77 => Instruction::I32Rotl,
        0x78 => Instruction::I32Rotr,

        0xC0 => Instruction::I32Extend8S,
        0xC1 => Instruction::I32Extend16S,

        n => return Err(ParseError::InvalidOpcode(n)),
    };

    Ok(Token::Instruction(ins))
}

fn expect_reserved_zero<R: Read + ?Sized>(reader: &mut R) -> Result<(), MemoryError> {
    match read_byte(reader).map_err(MemoryError::ReadReservedByte)? {
        0x00 => Ok(()),
        b => Err(MemoryError::InvalidReservedByte(b)),
    }
}

#[derive(Debug, Error)]
pub enum MemargError {
    #[error("failed decoding alignment")]
    Align(#[source] DecodeIntegerError),

    #[error("failed decoding offset")]
    Offset(#[source] DecodeIntegerError),
}

impl Memarg {
    fn decode<R: Read + ?Sized>(reader: &mut R) -> Result<Memarg, MemargError> {
        let align = decode_u32(reader).map_err(MemargError::Align)?;
        let offset = decode_u32(reader).map_err(MemargError::Offset)?;
        Ok(Memarg { align, offset })
    }
}

#[derive(Debug, Error)]
pub enum BlockTypeError {
    #[error("failed reading block type marker byte")]
    ReadMarkerByte(#[source] io::Error),

    #[error("failed decoding block type index")]
    DecodeIndex(#[from] DecodeIntegerError),

    #[error("block type index out of range: {0}")]
    IndexOutOfRange(i64),
}

impl BlockType {
    pub(crate) const EMPTY_MARKER: u8 = 0x40;

    fn decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, BlockTypeError> {
        let b = read_byte(reader).map_err(BlockTypeError::ReadMarkerByte)?;
        if b == Self::EMPTY_MARKER {
            return Ok(Self::Empty);
        }
        if let Ok(t) = ValType::from_marker(b) {
            return Ok(Self::Value(t));
        }

        // Type indices are encoded as non-negative s33 values, so that their first byte can
        // never collide with 0x40 or a value type marker, which all read as negative numbers.
        let mut reader = io::Cursor::new([b]).chain(reader);
        let x = decode_s33(&mut reader)?;
        let idx = u32::try_from(x).map_err(|_| BlockTypeError::IndexOutOfRange(x))?;
        Ok(Self::Type(TypeIdx(idx)))
    }
}
