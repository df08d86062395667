use crate::core::indices::MemIdx;
use crate::core::{Data, DataMode};
use crate::decode::helpers::{
    DecodeByteVectorError, DecodeListError, ParseExpressionError, decode_byte_vector, decode_expr,
    decode_list,
};
use crate::decode::indices::DecodeIndexError;
use crate::decode::integer::{DecodeIntegerError, decode_u32};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeDataSectionError {
    #[error("failed decoding Data section")]
    DecodeVector(#[from] DecodeListError<DecodeDataSegmentError>),
}

pub(crate) fn decode_data_section<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<Vec<Data>, DecodeDataSectionError> {
    Ok(decode_list(reader, parse_data)?)
}

#[derive(Debug, Error)]
pub enum DecodeDataSegmentError {
    #[error("failed decoding bitfield")]
    DecodeBitfield(#[source] DecodeIntegerError),

    #[error("invalid bitfield: expected 0 (active), 1 (passive) or 2 (active with memory); got {0}")]
    InvalidBitfield(u32),

    #[error("failed decoding offset expression")]
    DecodeOffsetExpr(#[from] ParseExpressionError),

    #[error("failed decoding init byte vector")]
    DecodeInitVector(#[from] DecodeByteVectorError),

    #[error(transparent)]
    DecodeMemIdx(#[from] DecodeIndexError),
}

fn parse_data<R: Read + ?Sized>(reader: &mut R) -> Result<Data, DecodeDataSegmentError> {
    let mode = match decode_u32(reader).map_err(DecodeDataSegmentError::DecodeBitfield)? {
        0 => DataMode::Active {
            memory: None,
            offset: decode_expr(reader)?,
        },
        1 => DataMode::Passive,
        2 => {
            let memory = Some(MemIdx::decode(reader)?);
            DataMode::Active {
                memory,
                offset: decode_expr(reader)?,
            }
        }
        n => return Err(DecodeDataSegmentError::InvalidBitfield(n)),
    };

    Ok(Data {
        init: decode_byte_vector(reader)?,
        mode,
    })
}
