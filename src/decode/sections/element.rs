use crate::core::indices::{FuncIdx, TableIdx};
use crate::core::types::RefType;
use crate::core::{Elem, ElemInit, ElemMode, Expr};
use crate::decode::helpers::{DecodeListError, ParseExpressionError, decode_expr, decode_list};
use crate::decode::indices::DecodeIndexError;
use crate::decode::integer::{DecodeIntegerError, decode_u32};
use crate::decode::read_byte;
use crate::decode::types::DecodeRefTypeError;
use std::io::{self, Read};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeElementSectionError {
    #[error("failed decoding Element section")]
    DecodeVector(#[from] DecodeListError<DecodeElementError>),
}

pub(crate) fn decode_element_section<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<Vec<Elem>, DecodeElementSectionError> {
    Ok(decode_list(reader, parse_elem)?)
}

#[derive(Debug, Error)]
pub enum DecodeElementError {
    #[error("failed decoding bitfield")]
    DecodeBitfield(#[source] DecodeIntegerError),

    #[error("invalid bitfield: expected value in range [0,7]; got {0}")]
    InvalidBitfield(u32),

    #[error("failed decoding offset expression")]
    DecodeOffsetExpression(#[source] ParseExpressionError),

    #[error("failed decoding element kind")]
    DecodeElementKind(#[from] DecodeElementKindError),

    #[error("failed decoding table index")]
    DecodeTableIdx(#[source] DecodeIndexError),

    #[error(transparent)]
    DecodeReferenceType(#[from] DecodeRefTypeError),

    #[error("failed decoding element expressions")]
    DecodeInitExprs(#[from] DecodeListError<ParseExpressionError>),

    #[error("failed decoding function indices")]
    DecodeInitFuncs(#[from] DecodeListError<DecodeIndexError>),
}

// Bit 0 of the bitfield marks a passive or declarative segment, bit 1 an explicit table index
// (when active) or a declarative segment (when not), and bit 2 expressions instead of plain
// function indices.
const NON_ACTIVE: u32 = 0b001;
const EXPLICIT_OR_DECLARATIVE: u32 = 0b010;
const USES_EXPRS: u32 = 0b100;

fn parse_elem<R: Read + ?Sized>(reader: &mut R) -> Result<Elem, DecodeElementError> {
    let bitfield = decode_u32(reader).map_err(DecodeElementError::DecodeBitfield)?;
    if bitfield > 7 {
        return Err(DecodeElementError::InvalidBitfield(bitfield));
    }

    let mode = if bitfield & NON_ACTIVE == 0 {
        let table = if bitfield & EXPLICIT_OR_DECLARATIVE != 0 {
            Some(TableIdx::decode(reader).map_err(DecodeElementError::DecodeTableIdx)?)
        } else {
            None
        };
        let offset = decode_expr(reader).map_err(DecodeElementError::DecodeOffsetExpression)?;
        ElemMode::Active { table, offset }
    } else if bitfield & EXPLICIT_OR_DECLARATIVE != 0 {
        ElemMode::Declarative
    } else {
        ElemMode::Passive
    };

    // forms 0 and 4 carry neither an element kind nor a reference type; they imply funcref
    let has_kind = bitfield & (NON_ACTIVE | EXPLICIT_OR_DECLARATIVE) != 0;

    let init = if bitfield & USES_EXPRS == 0 {
        if has_kind {
            parse_elemkind(reader)?;
        }
        ElemInit::Funcs(decode_list(reader, FuncIdx::decode)?)
    } else {
        let reftype = if has_kind {
            RefType::decode(reader)?
        } else {
            RefType::Func
        };
        let exprs: Vec<Expr> = decode_list(reader, decode_expr)?;
        ElemInit::Exprs(reftype, exprs)
    };

    Ok(Elem { mode, init })
}

#[derive(Debug, Error)]
pub enum DecodeElementKindError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("expected element kind byte 0x00; got {0:#04X}")]
    InvalidElemKind(u8),
}

// the only element kind is 0x00, meaning funcref
fn parse_elemkind<R: Read + ?Sized>(reader: &mut R) -> Result<(), DecodeElementKindError> {
    match read_byte(reader)? {
        0x00 => Ok(()),
        b => Err(DecodeElementKindError::InvalidElemKind(b)),
    }
}
