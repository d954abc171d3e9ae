//! SMBIOS entry point discovery.
//!
//! The loader signature picks the strategy: an EFI boot searches the EFI
//! configuration table, a BIOS boot scans the BIOS area. An EFI boot only
//! reaches the scan when its system table cannot be mapped; once the system
//! table is readable, a missing GUID or unmappable configuration table means
//! not found.

use crate::config::SmbiosConfig;
use crate::efi::{find_config_table, ConfigTableIter, EfiSystemTable, EfiWidth};
use crate::entry::SMBIOS2_ANCHOR;
use crate::error::Result;
use crate::guid::SMBIOS_TABLE_GUID;
use crate::region::ByteRegion;
use core::fmt;
use memdiag_hal::firmware::{BootParams, EfiLoaderSignature};
use memdiag_hal::mmu::{MapFlags, RegionMapper};
use memdiag_hal::PhysAddr;

cfg_if::cfg_if! {
    if #[cfg(target_pointer_width = "64")] {
        const EFI64_SUPPORTED: bool = true;
    } else {
        // 64-bit firmware tables are out of reach from a 32-bit build
        const EFI64_SUPPORTED: bool = false;
    }
}

/// How the entry point was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMethod {
    /// 64-bit EFI configuration table
    Efi64,
    /// 32-bit EFI configuration table
    Efi32,
    /// Signature scan of the legacy BIOS area
    LegacyScan,
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Efi64 => write!(f, "EFI64 configuration table"),
            Self::Efi32 => write!(f, "EFI32 configuration table"),
            Self::LegacyScan => write!(f, "legacy BIOS scan"),
        }
    }
}

/// A candidate entry point, not yet validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    /// Strategy that produced the address
    pub method: DiscoveryMethod,
    /// Physical address of the entry point
    pub address: PhysAddr,
}

/// Find the SMBIOS entry point
pub fn find_entry_point<M: RegionMapper + ?Sized>(
    mapper: &M,
    params: &BootParams,
    config: &SmbiosConfig,
) -> Option<Located> {
    let efi = cfg!(feature = "efi");

    let efi_path = match params.efi_loader_signature {
        EfiLoaderSignature::Efi64 if efi && EFI64_SUPPORTED => Some((DiscoveryMethod::Efi64, EfiWidth::Bits64)),
        EfiLoaderSignature::Efi32 if efi => Some((DiscoveryMethod::Efi32, EfiWidth::Bits32)),
        _ => None,
    };

    if let Some((method, width)) = efi_path {
        match map_system_table(mapper, params, width) {
            Ok(system_table) => {
                return report(method, search_system_table(mapper, &system_table, width));
            }
            Err(e) => log::info!("SMBIOS: EFI system table unavailable ({}), scanning BIOS area", e),
        }
    }

    if cfg!(feature = "legacy-scan") {
        report(DiscoveryMethod::LegacyScan, scan_legacy(mapper, config))
    } else {
        None
    }
}

fn report(method: DiscoveryMethod, address: Result<Option<PhysAddr>>) -> Option<Located> {
    match address {
        Ok(Some(address)) if !address.is_null() => {
            log::info!("SMBIOS: entry point candidate at {:#x} via {}", address, method);
            Some(Located { method, address })
        }
        Ok(_) => {
            log::info!("SMBIOS: no entry point found via {}", method);
            None
        }
        Err(e) => {
            log::warn!("SMBIOS: {} failed: {}", method, e);
            None
        }
    }
}

/// Map the EFI system table named by the boot parameters
fn map_system_table<'a, M: RegionMapper + ?Sized>(
    mapper: &'a M,
    params: &BootParams,
    width: EfiWidth,
) -> Result<ByteRegion<'a>> {
    let len = width.system_table_size();
    match width {
        EfiWidth::Bits64 => ByteRegion::map(mapper, params.system_table64(), len),
        EfiWidth::Bits32 => {
            let flags = MapFlags::firmware_table();
            // The loader's address is mapped, and the mapping itself is mapped
            // again before the table is read.
            let first = mapper.map(params.system_table32(), len, flags)?;
            let second = mapper.map(PhysAddr::new(first.as_u64()), len, flags)?;
            let bytes = mapper.view(second, len)?;
            Ok(ByteRegion::new(params.system_table32(), bytes))
        }
    }
}

/// Search a mapped system table's configuration table array
fn search_system_table<M: RegionMapper + ?Sized>(
    mapper: &M,
    system_table: &ByteRegion<'_>,
    width: EfiWidth,
) -> Result<Option<PhysAddr>> {
    let st = EfiSystemTable::decode(system_table, width)?;
    log::debug!(
        "SMBIOS: EFI system table rev {:#x}, {} configuration tables at {:#x}",
        st.revision,
        st.num_config_tables,
        st.config_tables
    );

    let len = st.config_tables_len(width)?;
    let tables = ByteRegion::map(mapper, st.config_tables, len)?;
    Ok(find_config_table(ConfigTableIter::new(tables, width), &SMBIOS_TABLE_GUID))
}

/// First "_SM_" anchor on a `legacy_step` boundary inside the legacy window
fn scan_legacy<M: RegionMapper + ?Sized>(mapper: &M, config: &SmbiosConfig) -> Result<Option<PhysAddr>> {
    let len = config.legacy_window_len();
    if len == 0 {
        return Ok(None);
    }

    let window = ByteRegion::map(mapper, config.legacy_start, len)?;
    let step = config.legacy_step.max(1);
    let found = window
        .bytes()
        .chunks(step)
        .position(|chunk| chunk.starts_with(&SMBIOS2_ANCHOR))
        .map(|index| window.address_of(index * step));

    Ok(found)
}
