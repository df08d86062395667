use crate::core::types::{GlobalType, Mut, ValType};
use crate::decode::types::valtype::DecodeValTypeError;
use crate::decode::{FromMarkerByte, read_byte};
use phf::phf_ordered_map;
use std::io::{self, Read};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeGlobalTypeError {
    #[error("failed decoding value type")]
    DecodeValueType(#[from] DecodeValTypeError),

    #[error("failed reading mutability byte")]
    ReadMutability(#[source] io::Error),

    #[error(transparent)]
    InvalidMutability(#[from] InvalidMutabilityByteError),
}

impl GlobalType {
    pub(crate) fn decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, DecodeGlobalTypeError> {
        let valtype = ValType::decode(reader)?;
        let byte = read_byte(reader).map_err(DecodeGlobalTypeError::ReadMutability)?;
        Ok(GlobalType(Mut::from_marker(byte)?, valtype))
    }
}

#[expect(non_upper_case_globals)]
static Mut_MARKERS: phf::OrderedMap<u8, Mut> = phf_ordered_map! {
    0x00u8 => Mut::Const,
    0x01u8 => Mut::Var,
};

#[derive(Debug, Error)]
#[error(
    "invalid mutability byte - expected one of {markers}; got {0:#04X}",
    markers = Mut::markers_formatted()
)]
pub struct InvalidMutabilityByteError(pub u8);

impl From<u8> for InvalidMutabilityByteError {
    fn from(b: u8) -> Self {
        Self(b)
    }
}

impl FromMarkerByte for Mut {
    type Error = InvalidMutabilityByteError;

    fn markers() -> &'static phf::OrderedMap<u8, Self> {
        &Mut_MARKERS
    }
}
