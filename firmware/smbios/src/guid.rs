//! GUID handling for EFI configuration table lookup.

use core::fmt;

/// GUID (Globally Unique Identifier)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid {
    /// Data 1 (time-low)
    pub data1: u32,
    /// Data 2 (time-mid)
    pub data2: u16,
    /// Data 3 (time-hi-and-version)
    pub data3: u16,
    /// Data 4 (clock-seq-hi-and-reserved, clock-seq-low, node)
    pub data4: [u8; 8],
}

impl Guid {
    /// Size of the in-memory encoding
    pub const SIZE: usize = 16;

    /// Create a GUID from components
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self { data1, data2, data3, data4 }
    }

    /// Check for the all-zero GUID
    pub fn is_null(&self) -> bool {
        self.data1 == 0 && self.data2 == 0 && self.data3 == 0 && self.data4 == [0; 8]
    }

    /// Decode the EFI in-memory layout (first three fields little-endian)
    pub fn from_bytes_le(bytes: &[u8; 16]) -> Self {
        Self {
            data1: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_le_bytes([bytes[4], bytes[5]]),
            data3: u16::from_le_bytes([bytes[6], bytes[7]]),
            data4: [bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]],
        }
    }

    /// Encode to the EFI in-memory layout
    pub fn to_bytes_le(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&self.data1.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.data2.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.data3.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.data4);
        bytes
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0], self.data4[1],
            self.data4[2], self.data4[3], self.data4[4],
            self.data4[5], self.data4[6], self.data4[7]
        )
    }
}

/// SMBIOS 2.x entry point table GUID
pub const SMBIOS_TABLE_GUID: Guid = Guid::new(
    0xEB9D2D31, 0x2D88, 0x11D3,
    [0x9A, 0x16, 0x00, 0x90, 0x27, 0x3F, 0xC1, 0x4D],
);

/// SMBIOS 3.x entry point table GUID; such entries are skipped with a debug log
pub const SMBIOS3_TABLE_GUID: Guid = Guid::new(
    0xF2FD1544, 0x9794, 0x4A2C,
    [0x99, 0x2E, 0xE5, 0xBB, 0xCF, 0x20, 0xE3, 0x94],
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smbios_guid_display() {
        assert_eq!(
            format!("{}", SMBIOS_TABLE_GUID),
            "EB9D2D31-2D88-11D3-9A16-0090273FC14D"
        );
    }

    #[test]
    fn test_mixed_endian_layout() {
        let bytes = SMBIOS_TABLE_GUID.to_bytes_le();
        assert_eq!(&bytes[0..4], &[0x31, 0x2D, 0x9D, 0xEB]);
        assert_eq!(&bytes[8..10], &[0x9A, 0x16]);
        assert_eq!(Guid::from_bytes_le(&bytes), SMBIOS_TABLE_GUID);
        assert_ne!(SMBIOS_TABLE_GUID, SMBIOS3_TABLE_GUID);
    }

    #[test]
    fn test_null_guid() {
        assert!(Guid::new(0, 0, 0, [0; 8]).is_null());
        assert!(!SMBIOS_TABLE_GUID.is_null());
    }
}
