use crate::core::types::{ResultType, ValType};
use crate::decode::types::valtype::DecodeValTypeError;
use crate::decode::{DecodeListError, helpers::decode_list};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed decoding result type")]
pub struct DecodeResultTypeError(#[from] pub DecodeListError<DecodeValTypeError>);

pub(crate) fn decode_result_type<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<ResultType, DecodeResultTypeError> {
    Ok(decode_list(reader, ValType::decode)?)
}
