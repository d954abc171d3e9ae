//! # Firmware Boot Parameters
//!
//! The slice of the bootloader's parameter block that tells us how the
//! firmware was entered and where the EFI system table lives.

use crate::PhysAddr;

/// EFI loader signature reported by the bootloader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EfiLoaderSignature {
    /// No EFI loader, BIOS boot
    None,
    /// 32-bit EFI loader
    Efi32,
    /// 64-bit EFI loader
    Efi64,
}

impl EfiLoaderSignature {
    /// Raw signature of a 32-bit EFI loader ("EL32")
    pub const EFI32_RAW: u32 = u32::from_le_bytes(*b"EL32");
    /// Raw signature of a 64-bit EFI loader ("EL64")
    pub const EFI64_RAW: u32 = u32::from_le_bytes(*b"EL64");

    /// Decode the raw `efi_loader_signature` field
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            Self::EFI32_RAW => Self::Efi32,
            Self::EFI64_RAW => Self::Efi64,
            _ => Self::None,
        }
    }
}

/// EFI-related fields of the boot parameter block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootParams {
    /// Loader signature
    pub efi_loader_signature: EfiLoaderSignature,
    /// Low 32 bits of the EFI system table physical address
    pub efi_system_table: u32,
    /// High 32 bits of the EFI system table physical address (64-bit loaders only)
    pub efi_system_table_hi: u32,
}

impl BootParams {
    /// Parameters for a BIOS boot
    pub const fn bios() -> Self {
        Self {
            efi_loader_signature: EfiLoaderSignature::None,
            efi_system_table: 0,
            efi_system_table_hi: 0,
        }
    }

    /// Parameters for a 32-bit EFI boot
    pub const fn efi32(system_table: u32) -> Self {
        Self {
            efi_loader_signature: EfiLoaderSignature::Efi32,
            efi_system_table: system_table,
            efi_system_table_hi: 0,
        }
    }

    /// Parameters for a 64-bit EFI boot
    pub const fn efi64(system_table: u64) -> Self {
        Self {
            efi_loader_signature: EfiLoaderSignature::Efi64,
            efi_system_table: system_table as u32,
            efi_system_table_hi: (system_table >> 32) as u32,
        }
    }

    /// System table address as seen by a 32-bit loader
    pub const fn system_table32(&self) -> PhysAddr {
        PhysAddr::new(self.efi_system_table as u64)
    }

    /// System table address as seen by a 64-bit loader
    pub const fn system_table64(&self) -> PhysAddr {
        PhysAddr::from_halves(self.efi_system_table, self.efi_system_table_hi)
    }
}
