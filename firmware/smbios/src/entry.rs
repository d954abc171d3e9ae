//! SMBIOS 2.x entry point decoding and validation.

use crate::error::{Result, SmbiosError};
use crate::region::ByteRegion;
use core::fmt;
use memdiag_hal::mmu::RegionMapper;
use memdiag_hal::PhysAddr;

// =============================================================================
// SMBIOS ENTRY POINT
// =============================================================================

/// SMBIOS 2.x anchor string
pub const SMBIOS2_ANCHOR: [u8; 4] = *b"_SM_";

/// Intermediate anchor string
pub const DMI_ANCHOR: [u8; 5] = *b"_DMI_";

/// SMBIOS version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SmbiosVersion {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
}

impl SmbiosVersion {
    /// Create a version
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for SmbiosVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// SMBIOS 2.x entry point (32-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    /// Anchor string "_SM_"
    pub anchor: [u8; 4],
    /// Checksum
    pub checksum: u8,
    /// Entry point length
    pub length: u8,
    /// Major version
    pub major_version: u8,
    /// Minor version
    pub minor_version: u8,
    /// Maximum structure size
    pub max_structure_size: u16,
    /// Entry point revision
    pub entry_point_revision: u8,
    /// Formatted area
    pub formatted_area: [u8; 5],
    /// Intermediate anchor "_DMI_"
    pub intermediate_anchor: [u8; 5],
    /// Intermediate checksum
    pub intermediate_checksum: u8,
    /// Structure table length
    pub structure_table_length: u16,
    /// Structure table address
    pub structure_table_address: u32,
    /// Number of structures
    pub number_of_structures: u16,
    /// BCD revision
    pub bcd_revision: u8,
}

impl EntryPoint {
    /// Size
    pub const SIZE: usize = 31;

    /// Decode from a region starting at the anchor
    pub fn decode(region: &ByteRegion<'_>) -> Result<Self> {
        let anchor: [u8; 4] = region.read_array(0)?;
        if anchor != SMBIOS2_ANCHOR {
            return Err(SmbiosError::InvalidAnchor);
        }

        Ok(Self {
            anchor,
            checksum: region.read_u8(4)?,
            length: region.read_u8(5)?,
            major_version: region.read_u8(6)?,
            minor_version: region.read_u8(7)?,
            max_structure_size: region.read_u16(8)?,
            entry_point_revision: region.read_u8(10)?,
            formatted_area: region.read_array(11)?,
            intermediate_anchor: region.read_array(16)?,
            intermediate_checksum: region.read_u8(21)?,
            structure_table_length: region.read_u16(22)?,
            structure_table_address: region.read_u32(24)?,
            number_of_structures: region.read_u16(28)?,
            bcd_revision: region.read_u8(30)?,
        })
    }

    /// Get version
    pub const fn version(&self) -> SmbiosVersion {
        SmbiosVersion::new(self.major_version, self.minor_version)
    }

    /// Physical address of the structure table
    pub const fn table_address(&self) -> PhysAddr {
        PhysAddr::new(self.structure_table_address as u64)
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Wrapping sum of `bytes`; a valid checksummed structure sums to zero
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |a, &b| a.wrapping_add(b))
}

/// Check the anchor, checksum and version of the entry point at `address`
///
/// The checksum covers exactly `length` bytes from the anchor. The `_DMI_`
/// intermediate checksum is only reported.
pub fn validate<M: RegionMapper + ?Sized>(
    mapper: &M,
    address: PhysAddr,
    min_version: SmbiosVersion,
) -> Result<EntryPoint> {
    let header = ByteRegion::map(mapper, address, EntryPoint::SIZE)?;
    let ep = EntryPoint::decode(&header)?;

    let covered = if ep.length as usize <= EntryPoint::SIZE {
        header
    } else {
        ByteRegion::map(mapper, address, ep.length as usize)?
    };
    let sum = checksum(covered.slice(0, ep.length as usize)?);
    if sum != 0 {
        log::warn!("SMBIOS: entry point at {:#x} has bad checksum (sum {:#04x})", address, sum);
        return Err(SmbiosError::ChecksumMismatch { sum });
    }

    let intermediate = checksum(header.slice(16, EntryPoint::SIZE - 16)?);
    if ep.intermediate_anchor != DMI_ANCHOR || intermediate != 0 {
        log::debug!("SMBIOS: intermediate _DMI_ area does not verify, ignoring");
    }

    if ep.version() < min_version {
        log::warn!("SMBIOS: version {} below required {}", ep.version(), min_version);
        return Err(SmbiosError::UnsupportedVersion {
            major: ep.major_version,
            minor: ep.minor_version,
        });
    }

    log::info!(
        "SMBIOS {} entry point at {:#x}: table {:#x} ({} bytes, {} structures)",
        ep.version(),
        address,
        ep.table_address(),
        ep.structure_table_length,
        ep.number_of_structures
    );

    Ok(ep)
}
