//! LEB128 decoding of the integer widths used by the binary format.
//!
//! Unsigned and signed values share one reader per signedness, parameterized by the bit width
//! of the target type. Only the shortest encoding of a value is accepted: a trailing group that
//! carries nothing but zero or sign padding is rejected, so every accepted integer re-encodes to
//! the bytes it was read from.
//!
//! <https://www.w3.org/TR/wasm-core-2/#integers>
use crate::decode::read_byte;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeIntegerError {
    #[error("integer does not fit in {bits} bits")]
    TooLarge { bits: u32 },

    #[error("{bits}-bit integer representation too long")]
    RepresentationTooLong { bits: u32 },

    #[error("{bits}-bit integer is not minimally encoded")]
    NonMinimal { bits: u32 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DecodeIntegerError {
    /// Whether decoding failed because the input ended early.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

pub type DecodeU32Error = DecodeIntegerError;

const PAYLOAD: u8 = 0x7F;
const CONTINUATION: u8 = 0x80;
const SIGN: u8 = 0x40;

fn max_bytes(bits: u32) -> u32 {
    bits.div_ceil(7)
}

fn decode_unsigned<R: io::Read + ?Sized>(
    reader: &mut R,
    bits: u32,
) -> Result<u64, DecodeIntegerError> {
    let mut result: u64 = 0;
    let last = max_bytes(bits);

    for i in 1..=last {
        let byte = read_byte(reader)?;
        let shift = 7 * (i - 1);
        let payload = byte & PAYLOAD;

        if i == last {
            if byte & CONTINUATION != 0 {
                return Err(DecodeIntegerError::RepresentationTooLong { bits });
            }
            // only `bits - shift` bits of the final group belong to the value
            if u32::from(payload) >> (bits - shift) != 0 {
                return Err(DecodeIntegerError::TooLarge { bits });
            }
        }

        result |= u64::from(payload) << shift;
        if byte & CONTINUATION == 0 {
            if i > 1 && payload == 0 {
                return Err(DecodeIntegerError::NonMinimal { bits });
            }
            return Ok(result);
        }
    }

    Err(DecodeIntegerError::RepresentationTooLong { bits })
}

fn decode_signed<R: io::Read + ?Sized>(
    reader: &mut R,
    bits: u32,
) -> Result<i64, DecodeIntegerError> {
    let mut result: i64 = 0;
    let last = max_bytes(bits);
    let mut previous: u8 = 0;

    for i in 1..=last {
        let byte = read_byte(reader)?;
        let shift = 7 * (i - 1);
        let payload = byte & PAYLOAD;

        if i == last {
            if byte & CONTINUATION != 0 {
                return Err(DecodeIntegerError::RepresentationTooLong { bits });
            }
            // the unused high bits of the final group must replicate the sign bit
            let used = bits - shift;
            let mask = (PAYLOAD << (used - 1)) & PAYLOAD;
            if payload & mask != 0 && payload & mask != mask {
                return Err(DecodeIntegerError::TooLarge { bits });
            }
        }

        result |= i64::from(payload) << shift;
        if byte & CONTINUATION == 0 {
            // a final group that only repeats the previous group's sign bit adds nothing
            let sign_extension = if previous & SIGN == 0 { 0 } else { PAYLOAD };
            if i > 1 && payload == sign_extension {
                return Err(DecodeIntegerError::NonMinimal { bits });
            }
            let consumed = shift + 7;
            if consumed < 64 && byte & SIGN != 0 {
                result |= !0 << consumed;
            }
            return Ok(result);
        }
        previous = byte;
    }

    Err(DecodeIntegerError::RepresentationTooLong { bits })
}

pub(crate) fn decode_u32<R: io::Read + ?Sized>(reader: &mut R) -> Result<u32, DecodeIntegerError> {
    let value = decode_unsigned(reader, 32)?;
    u32::try_from(value).map_err(|_| DecodeIntegerError::TooLarge { bits: 32 })
}

pub(crate) fn decode_i32<R: io::Read + ?Sized>(reader: &mut R) -> Result<i32, DecodeIntegerError> {
    let value = decode_signed(reader, 32)?;
    i32::try_from(value).map_err(|_| DecodeIntegerError::TooLarge { bits: 32 })
}

/// The 33-bit signed integer used for type indices in block types. Only the non-negative range
/// is meaningful there, but the full range is decoded so the caller can report it.
pub(crate) fn decode_s33<R: io::Read + ?Sized>(reader: &mut R) -> Result<i64, DecodeIntegerError> {
    decode_signed(reader, 33)
}

pub(crate) fn decode_i64<R: io::Read + ?Sized>(reader: &mut R) -> Result<i64, DecodeIntegerError> {
    decode_signed(reader, 64)
}
