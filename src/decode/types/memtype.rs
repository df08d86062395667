use crate::core::types::MemType;
use crate::decode::types::limits::{ParseLimitsError, parse_limits};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed decoding memory type")]
pub struct DecodeMemoryTypeError(#[from] pub ParseLimitsError);

impl MemType {
    pub(crate) fn decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, DecodeMemoryTypeError> {
        Ok(MemType {
            limits: parse_limits(reader)?,
        })
    }
}
