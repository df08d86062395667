use crate::core::types::ValType;
use crate::core::{Code, Locals};
use crate::decode::helpers::{DecodeListError, ParseExpressionError, decode_expr, decode_list};
use crate::decode::integer::{DecodeIntegerError, decode_u32};
use crate::decode::types::DecodeValTypeError;
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeCodeSectionError {
    #[error("failed decoding Code section")]
    DecodeVector(#[from] DecodeListError<DecodeCodeError>),
}

pub(crate) fn decode_code_section<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<Vec<Code>, DecodeCodeSectionError> {
    Ok(decode_list(reader, parse_code)?)
}

#[derive(Debug, Error)]
pub enum DecodeCodeError {
    #[error("failed decoding size of function code")]
    DecodeFunctionSize(#[source] DecodeIntegerError),

    #[error("failed decoding locals vector")]
    DecodeLocalsVector(#[from] DecodeListError<DecodeCodeLocalsError>),

    #[error("failed decoding function body expression")]
    DecodeFunctionBody(#[from] ParseExpressionError),

    #[error("Code entry size mismatch: declared {declared} bytes; {leftover} left unread")]
    EntrySizeMismatch { declared: u32, leftover: u64 },
}

fn parse_code<R: Read + ?Sized>(reader: &mut R) -> Result<Code, DecodeCodeError> {
    let size = decode_u32(reader).map_err(DecodeCodeError::DecodeFunctionSize)?;
    let mut reader = reader.take(size.into());

    let mut total_locals: u64 = 0;
    let locals = decode_list(&mut reader, |r| parse_locals(r, &mut total_locals))?;
    let body = decode_expr(&mut reader)?;

    if reader.limit() != 0 {
        return Err(DecodeCodeError::EntrySizeMismatch {
            declared: size,
            leftover: reader.limit(),
        });
    }

    Ok(Code { locals, body })
}

#[derive(Debug, Error)]
pub enum DecodeCodeLocalsError {
    #[error("failed decoding count of function locals")]
    DecodeLocalsCount(#[source] DecodeIntegerError),

    #[error("too many locals: expected at most {max}; got {actual}", max = u32::MAX)]
    TooManyLocals { actual: u64 },

    #[error("failed decoding local value type")]
    DecodeLocalValType(#[from] DecodeValTypeError),
}

fn parse_locals<R: Read + ?Sized>(
    reader: &mut R,
    total: &mut u64,
) -> Result<Locals, DecodeCodeLocalsError> {
    let count = decode_u32(reader).map_err(DecodeCodeLocalsError::DecodeLocalsCount)?;

    *total += u64::from(count);
    if *total > u64::from(u32::MAX) {
        return Err(DecodeCodeLocalsError::TooManyLocals { actual: *total });
    }

    Ok(Locals {
        count,
        t: ValType::decode(reader)?,
    })
}
