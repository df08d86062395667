use crate::core::types::Limits;
use crate::exec::ExecError;

pub const PAGE_SIZE: usize = 65_536;
const MAX_PAGES: u32 = 65_536;

/// A linear memory: a byte vector that grows in whole pages.
///
/// Accessors take the final byte address; adding a static offset to a dynamic base is the
/// instruction's business.
#[derive(Debug)]
pub struct Memory {
    bytes: Vec<u8>,
    max: Option<u32>,
}

impl Memory {
    pub fn new(limits: Limits) -> Result<Self, ExecError> {
        if limits.min > MAX_PAGES {
            return Err(ExecError::MemoryTooLarge(limits.min));
        }
        Ok(Memory {
            bytes: vec![0; limits.min as usize * PAGE_SIZE],
            max: limits.max,
        })
    }

    /// Current size in pages.
    pub fn size(&self) -> u32 {
        (self.bytes.len() / PAGE_SIZE) as u32
    }

    pub fn max(&self) -> Option<u32> {
        self.max
    }

    pub fn len_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Grow by `delta` pages, returning the previous size in pages, or `None` if the memory
    /// cannot grow that far.
    pub fn grow(&mut self, delta: u32) -> Option<u32> {
        let old = self.size();
        let new = old.checked_add(delta)?;
        if new > self.max.unwrap_or(MAX_PAGES).min(MAX_PAGES) {
            return None;
        }
        self.bytes.resize(new as usize * PAGE_SIZE, 0);
        Some(old)
    }

    fn range(&self, addr: u64, len: usize) -> Result<std::ops::Range<usize>, ExecError> {
        let oob = || ExecError::MemoryOutOfBounds {
            addr,
            len,
            size: self.bytes.len(),
        };
        let start = usize::try_from(addr).map_err(|_| oob())?;
        let end = start.checked_add(len).ok_or_else(oob)?;
        if end > self.bytes.len() {
            return Err(oob());
        }
        Ok(start..end)
    }

    pub fn read(&self, addr: u64, len: usize) -> Result<&[u8], ExecError> {
        let range = self.range(addr, len)?;
        Ok(&self.bytes[range])
    }

    pub fn write(&mut self, addr: u64, data: &[u8]) -> Result<(), ExecError> {
        let range = self.range(addr, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    fn read_array<const N: usize>(&self, addr: u64) -> Result<[u8; N], ExecError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read(addr, N)?);
        Ok(buf)
    }

    pub fn read_i32(&self, addr: u64) -> Result<i32, ExecError> {
        Ok(i32::from_le_bytes(self.read_array(addr)?))
    }

    pub fn read_u16(&self, addr: u64) -> Result<u16, ExecError> {
        Ok(u16::from_le_bytes(self.read_array(addr)?))
    }

    pub fn read_u8(&self, addr: u64) -> Result<u8, ExecError> {
        Ok(self.read_array::<1>(addr)?[0])
    }

    pub fn write_i32(&mut self, addr: u64, value: i32) -> Result<(), ExecError> {
        self.write(addr, &value.to_le_bytes())
    }

    pub fn write_u16(&mut self, addr: u64, value: u16) -> Result<(), ExecError> {
        self.write(addr, &value.to_le_bytes())
    }

    pub fn write_u8(&mut self, addr: u64, value: u8) -> Result<(), ExecError> {
        self.write(addr, &[value])
    }
}
