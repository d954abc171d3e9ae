//! # Memdiag SMBIOS
//!
//! Finds the SMBIOS table before any operating system exists and extracts
//! the identification strings shown on the diagnostic boot screen.
//!
//! ## Pipeline
//!
//! 1. [`locate`]: EFI configuration table (64-bit, then 32-bit) or a scan of
//!    the legacy BIOS area, depending on how the machine booted
//! 2. [`entry`]: anchor, checksum and version checks on the entry point
//! 3. [`table`]: bounded walk of the structure table for the target type
//! 4. [`strings`]: decoding of the 1-based, double-NUL-terminated string area
//!
//! Firmware memory is never reinterpreted as Rust structures: everything is
//! decoded from bounds-checked byte views at explicit little-endian offsets.
//!
//! ## Example
//!
//! ```ignore
//! let mapper = unsafe { IdentityMapper::new() };
//! if let Ok(info) = memdiag_smbios::smbios_init(&mapper, &boot_params, &SmbiosConfig::new()) {
//!     print_smbios_startup_info(&mut &SCREEN, &info, &PresenterConfig::new());
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod efi;
pub mod entry;
pub mod error;
pub mod guid;
pub mod locate;
pub mod presenter;
pub mod record;
pub mod region;
pub mod strings;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use config::SmbiosConfig;
pub use entry::{EntryPoint, SmbiosVersion};
pub use error::{Result, SmbiosError};
pub use locate::DiscoveryMethod;
pub use presenter::{print_smbios_startup_info, PresenterConfig, TextConsole};
pub use record::IdentityRecord;

use memdiag_hal::firmware::BootParams;
use memdiag_hal::mmu::RegionMapper;
use memdiag_hal::PhysAddr;
use table::StructureTable;

/// Everything the diagnostic session keeps from SMBIOS
///
/// Borrows the mapped firmware tables; no strings are copied.
#[derive(Debug, Clone, Copy)]
pub struct DmiInfo<'a> {
    method: DiscoveryMethod,
    entry_address: PhysAddr,
    entry_point: EntryPoint,
    record: Option<IdentityRecord<'a>>,
}

impl<'a> DmiInfo<'a> {
    /// How the entry point was found
    pub const fn method(&self) -> DiscoveryMethod {
        self.method
    }

    /// Physical address of the entry point
    pub const fn entry_address(&self) -> PhysAddr {
        self.entry_address
    }

    /// Validated entry point
    pub const fn entry_point(&self) -> &EntryPoint {
        &self.entry_point
    }

    /// SMBIOS version
    pub const fn version(&self) -> SmbiosVersion {
        self.entry_point.version()
    }

    /// Last structure of the configured target type, if the table has one
    pub const fn record(&self) -> Option<&IdentityRecord<'a>> {
        self.record.as_ref()
    }
}

/// Locate, validate and walk the SMBIOS table
///
/// Runs once per boot. Any error means no SMBIOS data is available and the
/// caller should show nothing.
pub fn smbios_init<'a, M: RegionMapper + ?Sized>(
    mapper: &'a M,
    params: &BootParams,
    config: &SmbiosConfig,
) -> Result<DmiInfo<'a>> {
    let located = locate::find_entry_point(mapper, params, config).ok_or(SmbiosError::NotFound)?;
    let entry_point = entry::validate(mapper, located.address, config.min_version)?;

    let table = StructureTable::map(mapper, &entry_point)?;
    let record = table.find_last(config.target_type)?.map(IdentityRecord::new);

    match &record {
        Some(record) => log::debug!(
            "SMBIOS: type {} record, handle {:#06x}",
            record.structure_type(),
            record.handle()
        ),
        None => log::info!("SMBIOS: no type {} record in table", config.target_type),
    }

    Ok(DmiInfo {
        method: located.method,
        entry_address: located.address,
        entry_point,
        record,
    })
}
