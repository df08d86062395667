//! LEB128 encoding. Always emits the shortest representation of a value.
use std::io::{self, Write};

pub(crate) fn encode_u64<W: Write + ?Sized>(w: &mut W, mut value: u64) -> io::Result<()> {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            return w.write_all(&[byte]);
        }
        w.write_all(&[byte | 0x80])?;
    }
}

pub(crate) fn encode_i64<W: Write + ?Sized>(w: &mut W, mut value: i64) -> io::Result<()> {
    loop {
        let byte = (value & 0x7F) as u8;
        // arithmetic shift, so negative values converge on -1
        value >>= 7;
        let sign_bit_clear = byte & 0x40 == 0;
        if (value == 0 && sign_bit_clear) || (value == -1 && !sign_bit_clear) {
            return w.write_all(&[byte]);
        }
        w.write_all(&[byte | 0x80])?;
    }
}

pub(crate) fn encode_u32<W: Write + ?Sized>(w: &mut W, value: u32) -> io::Result<()> {
    encode_u64(w, value.into())
}

pub(crate) fn encode_i32<W: Write + ?Sized>(w: &mut W, value: i32) -> io::Result<()> {
    encode_i64(w, value.into())
}

pub(crate) fn encode_s33<W: Write + ?Sized>(w: &mut W, value: u32) -> io::Result<()> {
    encode_i64(w, value.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_bytes(value: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_u32(&mut buf, value).unwrap();
        buf
    }

    fn i32_bytes(value: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_i32(&mut buf, value).unwrap();
        buf
    }

    #[test]
    fn unsigned_values_use_the_shortest_form() {
        assert_eq!(u32_bytes(0), [0x00]);
        assert_eq!(u32_bytes(127), [0x7F]);
        assert_eq!(u32_bytes(128), [0x80, 0x01]);
        assert_eq!(u32_bytes(624_485), [0xE5, 0x8E, 0x26]);
        assert_eq!(u32_bytes(u32::MAX), [0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn signed_values_stop_once_the_sign_is_stable() {
        assert_eq!(i32_bytes(0), [0x00]);
        assert_eq!(i32_bytes(-1), [0x7F]);
        assert_eq!(i32_bytes(63), [0x3F]);
        // 64 has bit 6 set, which would read back as negative without a second byte
        assert_eq!(i32_bytes(64), [0xC0, 0x00]);
        assert_eq!(i32_bytes(-64), [0x40]);
        assert_eq!(i32_bytes(-65), [0xBF, 0x7F]);
        assert_eq!(i32_bytes(-123_456), [0xC0, 0xBB, 0x78]);
        assert_eq!(i32_bytes(i32::MIN), [0x80, 0x80, 0x80, 0x80, 0x78]);
        assert_eq!(i32_bytes(i32::MAX), [0xFF, 0xFF, 0xFF, 0xFF, 0x07]);
    }

    #[test]
    fn s33_indices_never_look_negative() {
        let mut buf = Vec::new();
        encode_s33(&mut buf, 64).unwrap();
        assert_eq!(buf, [0xC0, 0x00]);

        let mut buf = Vec::new();
        encode_s33(&mut buf, u32::MAX).unwrap();
        assert_eq!(buf, [0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn i64_extremes() {
        let mut buf = Vec::new();
        encode_i64(&mut buf, i64::MIN).unwrap();
        let mut expected = vec![0x80; 9];
        expected.push(0x7F);
        assert_eq!(buf, expected);
    }
}
