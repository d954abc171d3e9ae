//! # SMBIOS Discovery Configuration

use crate::entry::SmbiosVersion;
use crate::table::structure_type;
use memdiag_hal::PhysAddr;

/// Configuration for entry point discovery and table walking
#[derive(Debug, Clone)]
pub struct SmbiosConfig {
    /// Structure type whose last occurrence is kept by the table walk
    pub target_type: u8,
    /// Oldest entry point version accepted
    pub min_version: SmbiosVersion,
    /// First address of the legacy BIOS scan window
    pub legacy_start: PhysAddr,
    /// Last address of the legacy BIOS scan window (inclusive)
    pub legacy_end: PhysAddr,
    /// Anchor alignment inside the legacy window
    pub legacy_step: usize,
}

impl SmbiosConfig {
    /// Start of the BIOS read-only area
    pub const LEGACY_START: u64 = 0xF0000;
    /// End of the BIOS read-only area
    pub const LEGACY_END: u64 = 0xFFFFF;
    /// Entry point anchors sit on paragraph boundaries
    pub const LEGACY_STEP: usize = 16;

    /// Create default configuration
    ///
    /// The boot screen shows the board identification, so the walk targets
    /// Base Board records.
    pub const fn new() -> Self {
        Self {
            target_type: structure_type::BASEBOARD_INFORMATION,
            min_version: SmbiosVersion::new(2, 3),
            legacy_start: PhysAddr::new(Self::LEGACY_START),
            legacy_end: PhysAddr::new(Self::LEGACY_END),
            legacy_step: Self::LEGACY_STEP,
        }
    }

    /// Configuration that targets the System Information record instead
    pub const fn system_information() -> Self {
        Self {
            target_type: structure_type::SYSTEM_INFORMATION,
            ..Self::new()
        }
    }

    /// Size of the legacy scan window in bytes
    ///
    /// Zero for an inverted window or one too large to address.
    pub fn legacy_window_len(&self) -> usize {
        self.legacy_end
            .offset_from(self.legacy_start)
            .and_then(|span| usize::try_from(span).ok())
            .and_then(|span| span.checked_add(1))
            .unwrap_or(0)
    }
}

impl Default for SmbiosConfig {
    fn default() -> Self {
        Self::new()
    }
}
