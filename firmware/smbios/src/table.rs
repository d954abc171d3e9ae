//! SMBIOS structure table walking.
//!
//! The walk is bounded twice: by the table length (only that many bytes are
//! ever mapped) and by the structure count declared in the entry point.

use crate::entry::EntryPoint;
use crate::error::{Result, SmbiosError};
use crate::region::ByteRegion;
use crate::strings::StringTable;
use memdiag_hal::mmu::RegionMapper;
use memdiag_hal::PhysAddr;

// =============================================================================
// STRUCTURE HEADER
// =============================================================================

/// SMBIOS structure header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureHeader {
    /// Structure type
    pub structure_type: u8,
    /// Length of the formatted part, header included
    pub length: u8,
    /// Handle
    pub handle: u16,
}

impl StructureHeader {
    /// Size
    pub const SIZE: usize = 4;

    /// Decode the header at `offset`
    pub fn decode(region: &ByteRegion<'_>, offset: usize) -> Result<Self> {
        Ok(Self {
            structure_type: region.read_u8(offset)?,
            length: region.read_u8(offset + 1)?,
            handle: region.read_u16(offset + 2)?,
        })
    }
}

// =============================================================================
// STRUCTURE TYPES
// =============================================================================

/// SMBIOS structure types
pub mod structure_type {
    pub const BIOS_INFORMATION: u8 = 0;
    pub const SYSTEM_INFORMATION: u8 = 1;
    pub const BASEBOARD_INFORMATION: u8 = 2;
    /// Not treated specially by the walk; the table length and count bound it
    pub const END_OF_TABLE: u8 = 127;
}

/// One structure: formatted part plus its string area
#[derive(Debug, Clone, Copy)]
pub struct Structure<'a> {
    /// Header
    pub header: StructureHeader,
    /// Physical address of the header
    pub address: PhysAddr,
    /// Formatted part, header included (`header.length` bytes)
    pub data: &'a [u8],
    /// String area
    pub strings: StringTable<'a>,
}

impl<'a> Structure<'a> {
    /// Byte of the formatted part at `offset` (offsets count from the header)
    pub fn byte(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    /// String referenced by the index byte at `offset`
    pub fn string_at(&self, offset: usize) -> Option<&'a [u8]> {
        self.strings.get(self.byte(offset)?)
    }
}

// =============================================================================
// STRUCTURE TABLE
// =============================================================================

/// The structure table described by an entry point
#[derive(Debug, Clone, Copy)]
pub struct StructureTable<'a> {
    region: ByteRegion<'a>,
    declared_count: u16,
}

impl<'a> StructureTable<'a> {
    /// Wrap an already-mapped table
    pub const fn new(region: ByteRegion<'a>, declared_count: u16) -> Self {
        Self { region, declared_count }
    }

    /// Map exactly the table the entry point describes
    pub fn map<M: RegionMapper + ?Sized>(mapper: &'a M, ep: &EntryPoint) -> Result<Self> {
        let len = ep.structure_table_length as usize;
        let region = if len == 0 {
            ByteRegion::empty(ep.table_address())
        } else {
            ByteRegion::map(mapper, ep.table_address(), len)?
        };
        Ok(Self::new(region, ep.number_of_structures))
    }

    /// Walk the structures in table order
    pub fn structures(&self) -> StructureWalk<'a> {
        StructureWalk {
            region: self.region,
            declared_count: self.declared_count,
            offset: 0,
            processed: 0,
            failed: false,
        }
    }

    /// Last structure of `structure_type`
    ///
    /// The whole table is walked even after a match, so a corrupt tail still
    /// fails the lookup.
    pub fn find_last(&self, structure_type: u8) -> Result<Option<Structure<'a>>> {
        let mut found = None;
        for structure in self.structures() {
            let structure = structure?;
            if structure.header.structure_type == structure_type {
                found = Some(structure);
            }
        }
        Ok(found)
    }
}

// =============================================================================
// TABLE WALK
// =============================================================================

/// Structure iterator
///
/// Yields an error once and then stops when the table turns out to be malformed.
pub struct StructureWalk<'a> {
    region: ByteRegion<'a>,
    declared_count: u16,
    offset: usize,
    processed: u32,
    failed: bool,
}

impl<'a> StructureWalk<'a> {
    /// Structures yielded so far
    pub fn processed(&self) -> u32 {
        self.processed
    }

    fn parse_next(&mut self) -> Result<Structure<'a>> {
        let start = self.offset;
        let header = StructureHeader::decode(&self.region, start).map_err(|_| SmbiosError::TableCorrupt {
            offset: start,
            reason: "header runs past table end",
        })?;

        if (header.length as usize) < StructureHeader::SIZE {
            return Err(SmbiosError::TableCorrupt { offset: start, reason: "structure length below header size" });
        }

        let data = self
            .region
            .slice(start, header.length as usize)
            .map_err(|_| SmbiosError::TableCorrupt { offset: start, reason: "formatted area runs past table end" })?;

        let strings_start = start + header.length as usize;
        let tail = self.region.tail(strings_start).map_err(|_| SmbiosError::TableCorrupt {
            offset: strings_start,
            reason: "string area starts past table end",
        })?;
        let terminator = tail
            .windows(2)
            .position(|pair| pair == [0, 0])
            .ok_or(SmbiosError::TableCorrupt { offset: strings_start, reason: "unterminated string area" })?;
        let strings_len = terminator + 2;

        self.offset = strings_start + strings_len;
        self.processed += 1;

        Ok(Structure {
            header,
            address: self.region.address_of(start),
            data,
            strings: StringTable::new(&tail[..strings_len]),
        })
    }
}

impl<'a> Iterator for StructureWalk<'a> {
    type Item = Result<Structure<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.region.len() {
            return None;
        }

        if self.processed >= self.declared_count as u32 {
            self.failed = true;
            log::warn!(
                "SMBIOS: table continues past {} declared structures at offset {:#x}",
                self.declared_count,
                self.offset
            );
            return Some(Err(SmbiosError::TooManyStructures { declared: self.declared_count }));
        }

        let result = self.parse_next();
        if let Err(e) = &result {
            self.failed = true;
            log::warn!("SMBIOS: {}", e);
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FakeMemory};

    const TABLE: u64 = 0xE1000;

    fn table_bytes(structures: &[Vec<u8>]) -> Vec<u8> {
        structures.concat()
    }

    fn bios_information() -> Vec<u8> {
        testing::structure(structure_type::BIOS_INFORMATION, 0x0000, &[1, 2, 0, 0xF0, 3, 0], &["Vendor", "1.0", "01/01/2024"])
    }

    fn table(bytes: &[u8], declared: u16) -> StructureTable<'_> {
        StructureTable::new(ByteRegion::new(PhysAddr::new(TABLE), bytes), declared)
    }

    #[test]
    fn test_single_match() {
        let bytes = table_bytes(&[
            bios_information(),
            testing::baseboard(0x0002, &["Acme", "Board-X", "1.0", "SN1"]),
            testing::structure(structure_type::END_OF_TABLE, 0xFEFF, &[], &[]),
        ]);
        let found = table(&bytes, 3).find_last(structure_type::BASEBOARD_INFORMATION).unwrap().unwrap();
        assert_eq!(found.header.handle, 0x0002);
        assert_eq!(found.string_at(4), Some(&b"Acme"[..]));
        assert_eq!(found.string_at(5), Some(&b"Board-X"[..]));

        assert_eq!(found.address, PhysAddr::new(TABLE + bios_information().len() as u64));
    }

    #[test]
    fn test_last_match_wins() {
        let bytes = table_bytes(&[
            testing::baseboard(0x0010, &["First"]),
            testing::baseboard(0x0011, &["Second"]),
            testing::structure(structure_type::END_OF_TABLE, 0xFEFF, &[], &[]),
        ]);
        let found = table(&bytes, 3).find_last(structure_type::BASEBOARD_INFORMATION).unwrap().unwrap();
        assert_eq!(found.header.handle, 0x0011);
        assert_eq!(found.string_at(4), Some(&b"Second"[..]));
    }

    #[test]
    fn test_end_of_table_is_not_special() {
        let bytes = table_bytes(&[
            testing::structure(structure_type::END_OF_TABLE, 0xFEFF, &[], &[]),
            testing::baseboard(0x0002, &["After", "End"]),
        ]);
        let found = table(&bytes, 2).find_last(structure_type::BASEBOARD_INFORMATION).unwrap();
        assert_eq!(found.map(|s| s.header.handle), Some(0x0002));
    }

    #[test]
    fn test_declared_count_guard() {
        let bytes = table_bytes(&[
            testing::baseboard(1, &["A"]),
            testing::baseboard(2, &["B"]),
            testing::baseboard(3, &["C"]),
        ]);
        let result = table(&bytes, 2).find_last(structure_type::BASEBOARD_INFORMATION);
        assert_eq!(result.unwrap_err(), SmbiosError::TooManyStructures { declared: 2 });

        let mut walk = table(&bytes, 2).structures();
        assert!(walk.next().unwrap().is_ok());
        assert!(walk.next().unwrap().is_ok());
        assert!(walk.next().unwrap().is_err());
        assert!(walk.next().is_none());
        assert_eq!(walk.processed(), 2);
    }

    #[test]
    fn test_walk_maps_only_the_declared_table() {
        let bytes = table_bytes(&[
            testing::baseboard(1, &["A"]),
            testing::baseboard(2, &["B"]),
            testing::baseboard(3, &["C"]),
        ]);
        let ep_bytes = testing::entry_point(TABLE as u32, bytes.len() as u16, 1, 2, 8);
        let ep = EntryPoint::decode(&ByteRegion::new(PhysAddr::new(0xF0000), &ep_bytes)).unwrap();
        let memory = FakeMemory::new().with(TABLE, &bytes);

        let table = StructureTable::map(&memory, &ep).unwrap();
        assert!(table.find_last(structure_type::BASEBOARD_INFORMATION).is_err());
        assert_eq!(memory.map_calls(), vec![(TABLE, bytes.len())]);
    }

    #[test]
    fn test_empty_table() {
        let ep_bytes = testing::entry_point(TABLE as u32, 0, 0, 2, 8);
        let ep = EntryPoint::decode(&ByteRegion::new(PhysAddr::new(0xF0000), &ep_bytes)).unwrap();
        let memory = FakeMemory::new();

        let table = StructureTable::map(&memory, &ep).unwrap();
        let mut walk = table.structures();
        assert!(walk.next().is_none());
        assert_eq!(walk.processed(), 0);
        assert!(table.find_last(structure_type::BASEBOARD_INFORMATION).unwrap().is_none());
        assert!(memory.map_calls().is_empty());
    }

    #[test]
    fn test_unterminated_strings_fail_inside_table() {
        let mut bytes = testing::baseboard(1, &["Acme"]);
        bytes.truncate(bytes.len() - 1);
        let result = table(&bytes, 4).find_last(structure_type::BASEBOARD_INFORMATION);
        assert!(matches!(result, Err(SmbiosError::TableCorrupt { reason: "unterminated string area", .. })));
    }

    #[test]
    fn test_short_length_is_corrupt() {
        let bytes = [2u8, 2, 0, 0, 0, 0];
        let result = table(&bytes, 4).find_last(structure_type::BASEBOARD_INFORMATION);
        assert!(matches!(result, Err(SmbiosError::TableCorrupt { offset: 0, .. })));
    }

    #[test]
    fn test_formatted_area_past_end_is_corrupt() {
        let bytes = [2u8, 0x20, 0, 0, 1, 2];
        let result = table(&bytes, 4).find_last(structure_type::BASEBOARD_INFORMATION);
        assert!(matches!(result, Err(SmbiosError::TableCorrupt { .. })));
    }

    #[test]
    fn test_no_match() {
        let bytes = testing::structure(structure_type::BIOS_INFORMATION, 0, &[1], &["Vendor"]);
        assert!(table(&bytes, 1).find_last(structure_type::BASEBOARD_INFORMATION).unwrap().is_none());
    }
}
