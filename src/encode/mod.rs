//! Encoding of a [`Module`] tree back into the binary format.
//!
//! The encoder is the inverse of [`crate::decode`]: decoding a module and encoding the result
//! reproduces the input byte for byte, provided the input used the shortest LEB128 forms.
use crate::core::Module;
use std::io::{self, Write};
use thiserror::Error;

pub mod integer;
mod instructions;
mod sections;
mod types;

use integer::encode_u32;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed writing encoded bytes")]
    Io(#[from] io::Error),

    #[error("{what} length {len} exceeds the u32 range of the binary format")]
    LengthOverflow { what: &'static str, len: usize },
}

pub(crate) fn encode_len<W: Write + ?Sized>(
    w: &mut W,
    what: &'static str,
    len: usize,
) -> Result<(), EncodeError> {
    let n = u32::try_from(len).map_err(|_| EncodeError::LengthOverflow { what, len })?;
    Ok(encode_u32(w, n)?)
}

pub(crate) fn encode_list<W, T, F>(
    w: &mut W,
    items: &[T],
    mut encode_fn: F,
) -> Result<(), EncodeError>
where
    W: Write + ?Sized,
    F: FnMut(&mut W, &T) -> Result<(), EncodeError>,
{
    encode_len(w, "vector", items.len())?;
    for item in items {
        encode_fn(w, item)?;
    }
    Ok(())
}

pub(crate) fn encode_byte_vector<W: Write + ?Sized>(
    w: &mut W,
    bytes: &[u8],
) -> Result<(), EncodeError> {
    encode_len(w, "byte vector", bytes.len())?;
    Ok(w.write_all(bytes)?)
}

pub(crate) fn encode_name<W: Write + ?Sized>(w: &mut W, name: &str) -> Result<(), EncodeError> {
    encode_len(w, "name", name.len())?;
    Ok(w.write_all(name.as_bytes())?)
}

/// Write `body` preceded by its length. Used for section bodies and function bodies, which are
/// built in a scratch buffer first since their size is only known afterwards.
pub(crate) fn append_sized<W: Write + ?Sized>(w: &mut W, body: &[u8]) -> Result<(), EncodeError> {
    encode_len(w, "body", body.len())?;
    Ok(w.write_all(body)?)
}

impl Module {
    /// Encode the module into `w` in the binary format.
    pub fn encode(&self, mut w: impl Write) -> Result<(), EncodeError> {
        w.write_all(&self.magic)?;
        w.write_all(&self.version)?;
        for section in &self.sections {
            section.encode(&mut w)?;
        }
        Ok(())
    }

    /// Encode the module into a freshly allocated buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }
}
