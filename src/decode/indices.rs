//! Decoding for WebAssembly indices.
//!
//! All indices share the same encoding, a plain `u32`, so they also share one error type that
//! names the index space being read.
//!
//! See <https://www.w3.org/TR/wasm-core-2/#binary-index>
use crate::core::indices::{FuncIdx, GlobalIdx, LabelIdx, LocalIdx, MemIdx, TableIdx, TypeIdx};
use crate::decode::integer::{DecodeIntegerError, decode_u32};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed decoding {space} index")]
pub struct DecodeIndexError {
    pub space: &'static str,
    #[source]
    pub source: DecodeIntegerError,
}

macro_rules! impl_index_decode {
    ($($name:ident => $space:literal),+ $(,)?) => {
        $(
            impl $name {
                pub(crate) fn decode<R: Read + ?Sized>(
                    reader: &mut R,
                ) -> Result<Self, DecodeIndexError> {
                    decode_u32(reader)
                        .map(Self)
                        .map_err(|source| DecodeIndexError { space: $space, source })
                }
            }
        )+
    };
}

impl_index_decode! {
    TypeIdx => "type",
    FuncIdx => "function",
    TableIdx => "table",
    MemIdx => "memory",
    GlobalIdx => "global",
    LocalIdx => "local",
    LabelIdx => "label",
}
