use crate::core::types::FuncType;
use crate::decode::helpers::{DecodeListError, decode_list};
use crate::decode::types::DecodeFuncTypeError;
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed decoding Type section")]
pub struct DecodeTypeSectionError(#[from] pub DecodeListError<DecodeFuncTypeError>);

pub(crate) fn decode_type_section<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<Vec<FuncType>, DecodeTypeSectionError> {
    Ok(decode_list(reader, FuncType::decode)?)
}
