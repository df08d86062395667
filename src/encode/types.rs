use crate::core::types::{FuncType, GlobalType, Limits, MemType, Mut, RefType, TableType, ValType};
use crate::decode::FromMarkerByte;
use crate::encode::integer::encode_u32;
use crate::encode::{EncodeError, encode_list};
use std::io::Write;

impl ValType {
    pub(crate) fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), EncodeError> {
        Ok(w.write_all(&[ValType::to_marker(*self)])?)
    }
}

impl RefType {
    pub(crate) fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), EncodeError> {
        Ok(w.write_all(&[RefType::to_marker(*self)])?)
    }
}

impl FuncType {
    pub(crate) fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), EncodeError> {
        w.write_all(&[FuncType::MARKER_BYTE])?;
        encode_list(w, &self.parameters, |w, t| t.encode(w))?;
        encode_list(w, &self.results, |w, t| t.encode(w))
    }
}

impl Limits {
    pub(crate) fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), EncodeError> {
        match self.max {
            None => {
                w.write_all(&[0x00])?;
                encode_u32(w, self.min)?;
            }
            Some(max) => {
                w.write_all(&[0x01])?;
                encode_u32(w, self.min)?;
                encode_u32(w, max)?;
            }
        }
        Ok(())
    }
}

impl MemType {
    pub(crate) fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.limits.encode(w)
    }
}

impl TableType {
    pub(crate) fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.reftype.encode(w)?;
        self.limits.encode(w)
    }
}

impl GlobalType {
    pub(crate) fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), EncodeError> {
        let GlobalType(r#mut, valtype) = self;
        valtype.encode(w)?;
        Ok(w.write_all(&[Mut::to_marker(*r#mut)])?)
    }
}
