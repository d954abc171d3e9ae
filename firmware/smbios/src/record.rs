//! Identification record accessors.
//!
//! System Information (type 1) and Base Board (type 2) records share the
//! layout of their first four string references: manufacturer, product,
//! version, serial number. Type 1 continues with the system UUID and the
//! wake-up type.

use crate::guid::Guid;
use crate::table::{structure_type, Structure};

/// Offsets inside the formatted part, counted from the header
mod offset {
    pub const MANUFACTURER: usize = 0x04;
    pub const PRODUCT_NAME: usize = 0x05;
    pub const VERSION: usize = 0x06;
    pub const SERIAL_NUMBER: usize = 0x07;
    pub const UUID: usize = 0x08;
    pub const WAKEUP_TYPE: usize = 0x18;
}

/// The structure picked by the table walk
#[derive(Debug, Clone, Copy)]
pub struct IdentityRecord<'a> {
    structure: Structure<'a>,
}

impl<'a> IdentityRecord<'a> {
    /// Wrap a walked structure
    pub const fn new(structure: Structure<'a>) -> Self {
        Self { structure }
    }

    /// Underlying structure
    pub const fn structure(&self) -> &Structure<'a> {
        &self.structure
    }

    /// Structure type
    pub const fn structure_type(&self) -> u8 {
        self.structure.header.structure_type
    }

    /// Handle
    pub const fn handle(&self) -> u16 {
        self.structure.header.handle
    }

    /// Get manufacturer
    pub fn manufacturer(&self) -> Option<&'a [u8]> {
        self.structure.string_at(offset::MANUFACTURER)
    }

    /// Get product name
    pub fn product_name(&self) -> Option<&'a [u8]> {
        self.structure.string_at(offset::PRODUCT_NAME)
    }

    /// Get version
    pub fn version(&self) -> Option<&'a [u8]> {
        self.structure.string_at(offset::VERSION)
    }

    /// Get serial number
    pub fn serial_number(&self) -> Option<&'a [u8]> {
        self.structure.string_at(offset::SERIAL_NUMBER)
    }

    /// System UUID (System Information records only)
    ///
    /// All-zero and all-0xFF UUIDs mean "not set" / "not present".
    pub fn uuid(&self) -> Option<Guid> {
        if self.structure_type() != structure_type::SYSTEM_INFORMATION {
            return None;
        }
        let bytes: [u8; 16] = self
            .structure
            .data
            .get(offset::UUID..offset::UUID + 16)?
            .try_into()
            .ok()?;
        let uuid = Guid::from_bytes_le(&bytes);
        if uuid.is_null() || bytes == [0xFF; 16] {
            return None;
        }
        Some(uuid)
    }

    /// Get wakeup type (System Information records only)
    pub fn wakeup_type(&self) -> Option<WakeupType> {
        if self.structure_type() != structure_type::SYSTEM_INFORMATION {
            return None;
        }
        WakeupType::from_u8(self.structure.byte(offset::WAKEUP_TYPE)?)
    }
}

/// Wakeup type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeupType {
    Reserved,
    Other,
    Unknown,
    ApmTimer,
    ModemRing,
    LanRemote,
    PowerSwitch,
    PciPme,
    AcPowerRestored,
}

impl WakeupType {
    fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Reserved,
            1 => Self::Other,
            2 => Self::Unknown,
            3 => Self::ApmTimer,
            4 => Self::ModemRing,
            5 => Self::LanRemote,
            6 => Self::PowerSwitch,
            7 => Self::PciPme,
            8 => Self::AcPowerRestored,
            _ => return None,
        })
    }
}
