use crate::core::types::{RefType, TableType};
use crate::decode::types::limits::{ParseLimitsError, parse_limits};
use crate::decode::types::reftype::DecodeRefTypeError;
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeTableTypeError {
    #[error("failed decoding reference type")]
    DecodeRefType(#[from] DecodeRefTypeError),

    #[error("failed decoding limits")]
    DecodeLimits(#[from] ParseLimitsError),
}

impl TableType {
    pub(crate) fn decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, DecodeTableTypeError> {
        let reftype = RefType::decode(reader)?;
        let limits = parse_limits(reader)?;
        Ok(TableType { reftype, limits })
    }
}
