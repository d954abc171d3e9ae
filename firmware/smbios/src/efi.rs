//! EFI System Table and Configuration Table decoding
//!
//! Only the fields needed to find the SMBIOS entry point are decoded. Both the
//! 32-bit and 64-bit layouts are read at explicit offsets, so either can be
//! parsed regardless of the width the diagnostic itself was built for.

use crate::error::{Result, SmbiosError};
use crate::guid::{Guid, SMBIOS3_TABLE_GUID};
use crate::region::ByteRegion;
use memdiag_hal::PhysAddr;
use static_assertions::const_assert_eq;

// =============================================================================
// TABLE LAYOUT
// =============================================================================

/// "IBI SYST"
pub const EFI_SYSTEM_TABLE_SIGNATURE: u64 = u64::from_le_bytes(*b"IBI SYST");

/// Pointer width of the firmware's tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EfiWidth {
    /// 32-bit firmware (IA32)
    Bits32,
    /// 64-bit firmware (X64)
    Bits64,
}

impl EfiWidth {
    /// Size of a firmware pointer / UINTN
    pub const fn pointer_size(self) -> usize {
        match self {
            Self::Bits32 => 4,
            Self::Bits64 => 8,
        }
    }

    /// Size of `EFI_SYSTEM_TABLE`
    pub const fn system_table_size(self) -> usize {
        match self {
            Self::Bits32 => 72,
            Self::Bits64 => 120,
        }
    }

    /// Size of one `EFI_CONFIGURATION_TABLE` entry
    pub const fn config_entry_size(self) -> usize {
        Guid::SIZE + self.pointer_size()
    }

    /// Offset of `NumberOfTableEntries`; `ConfigurationTable` follows it
    const fn num_entries_offset(self) -> usize {
        match self {
            Self::Bits32 => 64,
            Self::Bits64 => 104,
        }
    }

    fn read_pointer(self, region: &ByteRegion<'_>, offset: usize) -> Result<u64> {
        match self {
            Self::Bits32 => Ok(region.read_u32(offset)? as u64),
            Self::Bits64 => region.read_u64(offset),
        }
    }
}

// Header (24) + eleven pointer-sized fields + FirmwareRevision padded to UINTN
const_assert_eq!(EfiWidth::Bits32.system_table_size(), 24 + 4 * 12);
const_assert_eq!(EfiWidth::Bits64.system_table_size(), 24 + 8 * 12);
const_assert_eq!(EfiWidth::Bits32.config_entry_size(), 20);
const_assert_eq!(EfiWidth::Bits64.config_entry_size(), 24);

// =============================================================================
// SYSTEM TABLE
// =============================================================================

/// The parts of `EFI_SYSTEM_TABLE` used for configuration table lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EfiSystemTable {
    /// Header signature, "IBI SYST" on conforming firmware
    pub signature: u64,
    /// Header revision
    pub revision: u32,
    /// Number of configuration table entries
    pub num_config_tables: u64,
    /// Physical address of the configuration table array
    pub config_tables: PhysAddr,
}

impl EfiSystemTable {
    /// Upper bound on `NumberOfTableEntries`; firmware publishes a few dozen at most
    pub const MAX_CONFIG_TABLES: u64 = 1024;

    /// Decode a system table of the given width
    pub fn decode(region: &ByteRegion<'_>, width: EfiWidth) -> Result<Self> {
        let count_offset = width.num_entries_offset();
        let table = Self {
            signature: region.read_u64(0)?,
            revision: region.read_u32(8)?,
            num_config_tables: width.read_pointer(region, count_offset)?,
            config_tables: PhysAddr::new(
                width.read_pointer(region, count_offset + width.pointer_size())?,
            ),
        };

        if table.signature != EFI_SYSTEM_TABLE_SIGNATURE {
            log::warn!("EFI system table signature {:#018x} unexpected", table.signature);
        }

        Ok(table)
    }

    /// Byte length of the configuration table array
    pub fn config_tables_len(&self, width: EfiWidth) -> Result<usize> {
        if self.num_config_tables > Self::MAX_CONFIG_TABLES {
            log::warn!("EFI system table lists {} configuration tables", self.num_config_tables);
            return Err(SmbiosError::TableCorrupt {
                offset: width.num_entries_offset(),
                reason: "configuration table count implausible",
            });
        }
        usize::try_from(self.num_config_tables)
            .ok()
            .and_then(|count| count.checked_mul(width.config_entry_size()))
            .ok_or(SmbiosError::TableCorrupt {
                offset: width.num_entries_offset(),
                reason: "configuration table count overflows",
            })
    }
}

// =============================================================================
// CONFIGURATION TABLE
// =============================================================================

/// One `EFI_CONFIGURATION_TABLE` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigTableEntry {
    /// Vendor GUID
    pub guid: Guid,
    /// Vendor table address
    pub table: PhysAddr,
}

/// Iterator over a mapped configuration table array
pub struct ConfigTableIter<'a> {
    region: ByteRegion<'a>,
    width: EfiWidth,
    offset: usize,
}

impl<'a> ConfigTableIter<'a> {
    /// Iterate the entries in `region`
    pub fn new(region: ByteRegion<'a>, width: EfiWidth) -> Self {
        Self { region, width, offset: 0 }
    }

    fn decode_at(&self, offset: usize) -> Result<ConfigTableEntry> {
        let guid = Guid::from_bytes_le(&self.region.read_array(offset)?);
        let table = self.width.read_pointer(&self.region, offset + Guid::SIZE)?;
        Ok(ConfigTableEntry { guid, table: PhysAddr::new(table) })
    }
}

impl<'a> Iterator for ConfigTableIter<'a> {
    type Item = ConfigTableEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.decode_at(self.offset).ok()?;
        self.offset += self.width.config_entry_size();
        Some(entry)
    }
}

/// Scan every entry for `guid`; the last match wins
pub fn find_config_table(entries: ConfigTableIter<'_>, guid: &Guid) -> Option<PhysAddr> {
    entries
        .inspect(|entry| {
            if entry.guid == SMBIOS3_TABLE_GUID && *guid != SMBIOS3_TABLE_GUID {
                log::debug!("EFI: skipping SMBIOS 3.x entry point at {:#x}", entry.table);
            }
        })
        .filter(|entry| entry.guid == *guid)
        .last()
        .map(|entry| entry.table)
}
