use crate::core::indices::TypeIdx;
use crate::core::types::{GlobalType, MemType, TableType};
use crate::core::{Import, ImportDesc};
use crate::decode::helpers::{DecodeListError, DecodeNameError, decode_list, decode_name};
use crate::decode::indices::DecodeIndexError;
use crate::decode::read_byte;
use crate::decode::types::{DecodeGlobalTypeError, DecodeMemoryTypeError, DecodeTableTypeError};
use std::io::{self, Read};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeImportSectionError {
    #[error("failed decoding Import section")]
    DecodeVector(#[from] DecodeListError<DecodeImportError>),
}

pub(crate) fn decode_import_section<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<Vec<Import>, DecodeImportSectionError> {
    Ok(decode_list(reader, parse_import)?)
}

#[derive(Debug, Error)]
pub enum DecodeImportError {
    #[error("failed decoding module name")]
    DecodeModuleName(#[source] DecodeNameError),

    #[error("failed decoding entity name")]
    DecodeName(#[source] DecodeNameError),

    #[error("failed reading import descriptor marker byte")]
    ReadDescriptorMarkerByte(#[source] io::Error),

    #[error(transparent)]
    DecodeTypeIdx(#[from] DecodeIndexError),

    #[error(transparent)]
    DecodeTableType(#[from] DecodeTableTypeError),

    #[error(transparent)]
    DecodeMemType(#[from] DecodeMemoryTypeError),

    #[error(transparent)]
    DecodeGlobalType(#[from] DecodeGlobalTypeError),

    #[error(
        "invalid import descriptor marker byte: expected 0x00 (func), 0x01 (table), 0x02 (mem) or 0x03 (global); got {0:#04X}"
    )]
    InvalidDescriptorMarkerByte(u8),
}

fn parse_import<R: Read + ?Sized>(reader: &mut R) -> Result<Import, DecodeImportError> {
    let module = decode_name(reader).map_err(DecodeImportError::DecodeModuleName)?;
    let name = decode_name(reader).map_err(DecodeImportError::DecodeName)?;

    let desc = match read_byte(reader).map_err(DecodeImportError::ReadDescriptorMarkerByte)? {
        0x00 => ImportDesc::Func(TypeIdx::decode(reader)?),
        0x01 => ImportDesc::Table(TableType::decode(reader)?),
        0x02 => ImportDesc::Mem(MemType::decode(reader)?),
        0x03 => ImportDesc::Global(GlobalType::decode(reader)?),
        n => return Err(DecodeImportError::InvalidDescriptorMarkerByte(n)),
    };

    Ok(Import { module, name, desc })
}
