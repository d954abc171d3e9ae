//! # Physical Region Mapping
//!
//! Pre-OS code reaches firmware tables through physical addresses. The
//! [`RegionMapper`] trait turns a physical range into something the CPU can
//! read, and exposes the result as a bounds-checked byte slice.

use crate::{HalError, HalResult, PhysAddr, VirtAddr};
use bitflags::bitflags;

bitflags! {
    /// Attributes requested for a mapped region
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MapFlags: u32 {
        /// Region may be cached
        const CACHEABLE = 1 << 0;
    }
}

impl MapFlags {
    /// Flags used for read-only firmware tables (EFI system/config tables, SMBIOS)
    pub const fn firmware_table() -> Self {
        Self::CACHEABLE
    }
}

/// Capability to make physical memory addressable
///
/// Mappings are never released: firmware tables stay mapped for the lifetime
/// of the diagnostic session.
pub trait RegionMapper {
    /// Map `len` bytes starting at `phys` and return the address they are reachable at
    fn map(&self, phys: PhysAddr, len: usize, flags: MapFlags) -> HalResult<VirtAddr>;

    /// Borrow `len` bytes at an address previously returned by [`RegionMapper::map`]
    fn view(&self, virt: VirtAddr, len: usize) -> HalResult<&[u8]>;

    /// Map a physical range and borrow it in one step
    fn map_bytes(&self, phys: PhysAddr, len: usize, flags: MapFlags) -> HalResult<&[u8]> {
        let virt = self.map(phys, len, flags)?;
        self.view(virt, len)
    }
}

impl<M: RegionMapper + ?Sized> RegionMapper for &M {
    fn map(&self, phys: PhysAddr, len: usize, flags: MapFlags) -> HalResult<VirtAddr> {
        (**self).map(phys, len, flags)
    }

    fn view(&self, virt: VirtAddr, len: usize) -> HalResult<&[u8]> {
        (**self).view(virt, len)
    }
}

/// Largest region a slice can describe
const MAX_REGION_LEN: usize = isize::MAX as usize;

/// Mapper for environments where physical memory is identity mapped
///
/// This is the situation on entry from a BIOS or EFI loader, before the
/// diagnostic kernel installs its own page tables.
#[derive(Debug)]
pub struct IdentityMapper {
    _private: (),
}

impl IdentityMapper {
    /// Create an identity mapper
    ///
    /// # Safety
    /// Every physical address handed to [`RegionMapper::map`] must be identity
    /// mapped and readable for the lifetime of the mapper.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegionMapper for IdentityMapper {
    fn map(&self, phys: PhysAddr, len: usize, _flags: MapFlags) -> HalResult<VirtAddr> {
        if phys.is_null() {
            return Err(HalError::InvalidAddress);
        }
        if len > MAX_REGION_LEN {
            return Err(HalError::InvalidParameter);
        }
        let end = phys.checked_add(len as u64).ok_or(HalError::AddressOverflow)?;
        if usize::try_from(end.as_u64()).is_err() {
            return Err(HalError::InvalidAddress);
        }
        Ok(VirtAddr::new(phys.as_u64()))
    }

    fn view(&self, virt: VirtAddr, len: usize) -> HalResult<&[u8]> {
        if virt.as_u64() == 0 {
            return Err(HalError::InvalidAddress);
        }
        if len > MAX_REGION_LEN {
            return Err(HalError::InvalidParameter);
        }
        if virt.as_u64().checked_add(len as u64).is_none() {
            return Err(HalError::AddressOverflow);
        }
        // SAFETY: the constructor contract guarantees identity-mapped,
        // readable memory for every address that went through `map`, and
        // `len` is within the bound `from_raw_parts` requires.
        Ok(unsafe { core::slice::from_raw_parts(virt.as_ptr::<u8>(), len) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firmware_table_flags() {
        let flags = MapFlags::firmware_table();
        assert!(flags.contains(MapFlags::CACHEABLE));
        assert_eq!(flags.bits(), 1);
    }

    #[test]
    fn test_identity_map_rejects_null_and_overflow() {
        // SAFETY: nothing is dereferenced in this test.
        let mapper = unsafe { IdentityMapper::new() };
        assert_eq!(
            mapper.map(PhysAddr::new(0), 16, MapFlags::firmware_table()),
            Err(HalError::InvalidAddress)
        );
        assert_eq!(
            mapper.map(PhysAddr::new(u64::MAX - 4), 16, MapFlags::firmware_table()),
            Err(HalError::AddressOverflow)
        );
    }

    #[test]
    fn test_identity_rejects_oversized_length() {
        // SAFETY: nothing is dereferenced in this test.
        let mapper = unsafe { IdentityMapper::new() };
        let len = isize::MAX as usize + 1;
        assert_eq!(
            mapper.map(PhysAddr::new(0x1000), len, MapFlags::firmware_table()),
            Err(HalError::InvalidParameter)
        );
        assert_eq!(mapper.view(VirtAddr::new(0x1000), len), Err(HalError::InvalidParameter));
        assert_eq!(mapper.view(VirtAddr::new(0x1000), usize::MAX), Err(HalError::InvalidParameter));
    }

    #[test]
    fn test_identity_view_of_live_buffer() {
        let buffer = [0x5Fu8, b'S', b'M', b'_'];
        // SAFETY: the buffer outlives every view taken from it.
        let mapper = unsafe { IdentityMapper::new() };
        let phys = PhysAddr::new(buffer.as_ptr() as u64);
        let bytes = mapper.map_bytes(phys, buffer.len(), MapFlags::firmware_table()).unwrap();
        assert_eq!(bytes, b"_SM_");
    }
}
