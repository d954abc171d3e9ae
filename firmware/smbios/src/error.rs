//! # Error Types
//!
//! Every failure in this crate means the same thing to the boot screen: no
//! SMBIOS data is available. The variants exist so the log says why.

use core::fmt;
use memdiag_hal::HalError;

/// SMBIOS discovery and decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmbiosError {
    /// No entry point was found by the selected discovery method
    NotFound,
    /// A physical region could not be mapped
    Map(HalError),
    /// A read went past the end of a mapped region
    Truncated { offset: usize, needed: usize },
    /// Entry point does not start with "_SM_"
    InvalidAnchor,
    /// Entry point bytes do not sum to zero
    ChecksumMismatch { sum: u8 },
    /// Entry point version is below the supported minimum
    UnsupportedVersion { major: u8, minor: u8 },
    /// Structure table is malformed at the given offset
    TableCorrupt { offset: usize, reason: &'static str },
    /// More structures present than the entry point declares
    TooManyStructures { declared: u16 },
}

impl fmt::Display for SmbiosError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "SMBIOS entry point not found"),
            Self::Map(e) => write!(f, "Mapping failed: {}", e),
            Self::Truncated { offset, needed } => {
                write!(f, "Truncated read: {} bytes at offset {:#x}", needed, offset)
            }
            Self::InvalidAnchor => write!(f, "Invalid SMBIOS anchor"),
            Self::ChecksumMismatch { sum } => {
                write!(f, "SMBIOS checksum mismatch: sum is {:#04x}", sum)
            }
            Self::UnsupportedVersion { major, minor } => {
                write!(f, "Unsupported SMBIOS version {}.{}", major, minor)
            }
            Self::TableCorrupt { offset, reason } => {
                write!(f, "Structure table corrupt at offset {:#x}: {}", offset, reason)
            }
            Self::TooManyStructures { declared } => {
                write!(f, "Structure table holds more than the declared {} structures", declared)
            }
        }
    }
}

impl From<HalError> for SmbiosError {
    fn from(e: HalError) -> Self {
        Self::Map(e)
    }
}

/// Result type alias for SMBIOS operations
pub type Result<T> = core::result::Result<T, SmbiosError>;
