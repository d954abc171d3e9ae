//! Host-side test support: sparse fake physical memory and table builders.

use crate::efi::EfiWidth;
use crate::entry::EntryPoint;
use crate::guid::Guid;
use core::cell::RefCell;
use memdiag_hal::mmu::{MapFlags, RegionMapper};
use memdiag_hal::{HalError, HalResult, PhysAddr, VirtAddr};

/// Identity-mapped fake physical memory made of disjoint regions
#[derive(Debug, Default)]
pub struct FakeMemory {
    regions: Vec<(u64, Vec<u8>)>,
    maps: RefCell<Vec<(u64, usize)>>,
}

impl FakeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `bytes` at physical address `base`
    pub fn with(mut self, base: u64, bytes: &[u8]) -> Self {
        self.regions.push((base, bytes.to_vec()));
        self
    }

    /// Zero-filled region with `bytes` copied at `offset`
    pub fn with_at(mut self, base: u64, size: usize, offset: usize, bytes: &[u8]) -> Self {
        let mut region = vec![0u8; size];
        region[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.regions.push((base, region));
        self
    }

    /// Every `(address, len)` passed to `map`, in call order
    pub fn map_calls(&self) -> Vec<(u64, usize)> {
        self.maps.borrow().clone()
    }

    fn find(&self, addr: u64, len: usize) -> Option<&[u8]> {
        self.regions.iter().find_map(|(base, bytes)| {
            let start = addr.checked_sub(*base)? as usize;
            let end = start.checked_add(len)?;
            bytes.get(start..end)
        })
    }
}

impl RegionMapper for FakeMemory {
    fn map(&self, phys: PhysAddr, len: usize, _flags: MapFlags) -> HalResult<VirtAddr> {
        self.maps.borrow_mut().push((phys.as_u64(), len));
        match self.find(phys.as_u64(), len) {
            Some(_) => Ok(VirtAddr::new(phys.as_u64())),
            None => Err(HalError::MapFailed),
        }
    }

    fn view(&self, virt: VirtAddr, len: usize) -> HalResult<&[u8]> {
        self.find(virt.as_u64(), len).ok_or(HalError::InvalidAddress)
    }
}

/// Wrapping byte sum
pub fn byte_sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |a, &b| a.wrapping_add(b))
}

/// A well-formed 31-byte SMBIOS 2.x entry point
pub fn entry_point(table_address: u32, table_length: u16, structures: u16, major: u8, minor: u8) -> Vec<u8> {
    let mut ep = vec![0u8; EntryPoint::SIZE];
    ep[0..4].copy_from_slice(b"_SM_");
    ep[5] = EntryPoint::SIZE as u8;
    ep[6] = major;
    ep[7] = minor;
    ep[8..10].copy_from_slice(&0x100u16.to_le_bytes());
    ep[16..21].copy_from_slice(b"_DMI_");
    ep[22..24].copy_from_slice(&table_length.to_le_bytes());
    ep[24..28].copy_from_slice(&table_address.to_le_bytes());
    ep[28..30].copy_from_slice(&structures.to_le_bytes());
    ep[30] = (major << 4) | (minor & 0x0F);
    ep[21] = 0u8.wrapping_sub(byte_sum(&ep[16..31]));
    ep[4] = 0u8.wrapping_sub(byte_sum(&ep));
    ep
}

/// One SMBIOS structure: header, formatted body, and string area
pub fn structure(structure_type: u8, handle: u16, body: &[u8], strings: &[&str]) -> Vec<u8> {
    let mut out = vec![structure_type, (4 + body.len()) as u8];
    out.extend_from_slice(&handle.to_le_bytes());
    out.extend_from_slice(body);
    if strings.is_empty() {
        out.push(0);
    }
    for s in strings {
        out.extend_from_slice(s.as_bytes());
        out.push(0);
    }
    out.push(0);
    out
}

/// Base Board (type 2) record body referencing strings 1..=4
pub fn baseboard(handle: u16, strings: &[&str]) -> Vec<u8> {
    structure(2, handle, &[1, 2, 3, 4, 0, 0x09, 0x00, 0x00, 0x00, 0x0A, 0x00], strings)
}

/// System Information (type 1) record with UUID and wake-up type
pub fn system_information(handle: u16, uuid: [u8; 16], strings: &[&str]) -> Vec<u8> {
    let mut body = vec![1, 2, 3, 4];
    body.extend_from_slice(&uuid);
    body.push(0x06);
    body.extend_from_slice(&[0, 0]);
    structure(1, handle, &body, strings)
}

/// EFI system table with the configuration table fields filled in
pub fn system_table(width: EfiWidth, config_tables: u64, entries: u64) -> Vec<u8> {
    let mut st = vec![0u8; width.system_table_size()];
    st[0..8].copy_from_slice(b"IBI SYST");
    match width {
        EfiWidth::Bits32 => {
            st[64..68].copy_from_slice(&(entries as u32).to_le_bytes());
            st[68..72].copy_from_slice(&(config_tables as u32).to_le_bytes());
        }
        EfiWidth::Bits64 => {
            st[104..112].copy_from_slice(&entries.to_le_bytes());
            st[112..120].copy_from_slice(&config_tables.to_le_bytes());
        }
    }
    st
}

/// EFI configuration table array
pub fn config_table(width: EfiWidth, entries: &[(Guid, u64)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (guid, table) in entries {
        out.extend_from_slice(&guid.to_bytes_le());
        match width {
            EfiWidth::Bits32 => out.extend_from_slice(&(*table as u32).to_le_bytes()),
            EfiWidth::Bits64 => out.extend_from_slice(&table.to_le_bytes()),
        }
    }
    out
}
