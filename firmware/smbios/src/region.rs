//! Bounds-checked view over a mapped physical range.
//!
//! All firmware data is read through [`ByteRegion`]: fixed offsets,
//! little-endian, and an error instead of a read past the end.

use crate::error::{Result, SmbiosError};
use memdiag_hal::mmu::{MapFlags, RegionMapper};
use memdiag_hal::PhysAddr;

/// A mapped byte range and the physical address it starts at
#[derive(Debug, Clone, Copy)]
pub struct ByteRegion<'a> {
    base: PhysAddr,
    bytes: &'a [u8],
}

impl<'a> ByteRegion<'a> {
    /// Wrap already-mapped bytes
    pub const fn new(base: PhysAddr, bytes: &'a [u8]) -> Self {
        Self { base, bytes }
    }

    /// Zero-length region at `base`; nothing is mapped
    pub const fn empty(base: PhysAddr) -> Self {
        Self { base, bytes: &[] }
    }

    /// Map `len` bytes at `base` as a firmware table
    pub fn map<M: RegionMapper + ?Sized>(mapper: &'a M, base: PhysAddr, len: usize) -> Result<Self> {
        let bytes = mapper.map_bytes(base, len, MapFlags::firmware_table())?;
        Ok(Self { base, bytes })
    }

    /// Physical address of the first byte
    pub const fn base(&self) -> PhysAddr {
        self.base
    }

    /// Length in bytes
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if empty
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The whole region
    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Physical address of `offset`
    pub fn address_of(&self, offset: usize) -> PhysAddr {
        PhysAddr::new(self.base.as_u64().wrapping_add(offset as u64))
    }

    /// Borrow `len` bytes at `offset`
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(SmbiosError::Truncated { offset, needed: len })
    }

    /// Everything from `offset` to the end of the region
    pub fn tail(&self, offset: usize) -> Result<&'a [u8]> {
        self.bytes
            .get(offset..)
            .ok_or(SmbiosError::Truncated { offset, needed: 0 })
    }

    /// Read a fixed-size byte array
    pub fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(offset, N)?);
        Ok(out)
    }

    /// Read a byte
    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        self.bytes
            .get(offset)
            .copied()
            .ok_or(SmbiosError::Truncated { offset, needed: 1 })
    }

    /// Read a little-endian u16
    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array(offset)?))
    }

    /// Read a little-endian u32
    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array(offset)?))
    }

    /// Read a little-endian u64
    pub fn read_u64(&self, offset: usize) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array(offset)?))
    }
}
