use crate::decode::integer::{DecodeIntegerError, decode_u32};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed decoding data segment count")]
pub struct DecodeDataCountSectionError(#[from] pub DecodeIntegerError);

pub(crate) fn decode_datacount_section<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<u32, DecodeDataCountSectionError> {
    Ok(decode_u32(reader)?)
}
