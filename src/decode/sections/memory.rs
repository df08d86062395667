use crate::core::types::MemType;
use crate::decode::helpers::{DecodeListError, decode_list};
use crate::decode::types::DecodeMemoryTypeError;
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed decoding Memory section")]
pub struct DecodeMemorySectionError(#[from] pub DecodeListError<DecodeMemoryTypeError>);

pub(crate) fn decode_memory_section<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<Vec<MemType>, DecodeMemorySectionError> {
    Ok(decode_list(reader, MemType::decode)?)
}
