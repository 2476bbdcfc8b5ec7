use goblin::pe::section_table::SectionTable as GoblinSection;

use crate::{headers::SectionCharacteristics, Error, Result};

/// One row of the section table.
///
/// None of the fields are trusted: any of them may be zero, overlap another section, or point
/// past the end of the file. The values are kept exactly as declared; the
/// [`crate::sections::SectionLoader`] decides how to read them safely.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SectionHeaderEntry {
    /// Section name with trailing NUL padding removed; not necessarily unique
    pub name: String,
    /// The raw 8-byte name field
    pub raw_name: [u8; 8],
    /// 1-based position in the section table
    pub number: usize,
    /// RVA of the first byte of the section when mapped
    pub virtual_address: u32,
    /// Declared in-memory size
    pub virtual_size: u32,
    /// File offset of the section content, zero when there is none
    pub pointer_to_raw_data: u32,
    /// Declared on-disk size
    pub size_of_raw_data: u32,
    /// Section flags
    pub characteristics: SectionCharacteristics,
}

impl SectionHeaderEntry {
    /// Creates an entry from its declared values.
    ///
    /// The name is truncated to the 8 bytes a section header can hold.
    #[must_use]
    pub fn new(
        name: &str,
        number: usize,
        virtual_address: u32,
        virtual_size: u32,
        pointer_to_raw_data: u32,
        size_of_raw_data: u32,
        characteristics: u32,
    ) -> Self {
        let mut raw_name = [0u8; 8];
        let len = name.len().min(raw_name.len());
        raw_name[..len].copy_from_slice(&name.as_bytes()[..len]);

        SectionHeaderEntry {
            name: decode_name(&raw_name),
            raw_name,
            number,
            virtual_address,
            virtual_size,
            pointer_to_raw_data,
            size_of_raw_data,
            characteristics: SectionCharacteristics::from_bits_retain(characteristics),
        }
    }

    /// Converts a section header decoded by goblin.
    ///
    /// Object-file style long names (`/123`) resolved by goblin take precedence over the raw
    /// 8-byte field.
    #[must_use]
    pub fn from_goblin(section: &GoblinSection, number: usize) -> Self {
        let name = section
            .real_name
            .clone()
            .unwrap_or_else(|| decode_name(&section.name));

        SectionHeaderEntry {
            name,
            raw_name: section.name,
            number,
            virtual_address: section.virtual_address,
            virtual_size: section.virtual_size,
            pointer_to_raw_data: section.pointer_to_raw_data,
            size_of_raw_data: section.size_of_raw_data,
            characteristics: SectionCharacteristics::from_bits_retain(section.characteristics),
        }
    }

    /// Extent used to decide whether an RVA belongs to this section.
    ///
    /// This is the declared virtual size. Packed and hand-crafted files sometimes declare a
    /// virtual size of zero while still mapping raw content, in which case the raw size is used.
    #[must_use]
    pub fn effective_virtual_size(&self) -> u32 {
        if self.virtual_size == 0 {
            self.size_of_raw_data
        } else {
            self.virtual_size
        }
    }

    /// Returns `true` if `rva` lies in `[virtual_address, virtual_address + extent)`.
    ///
    /// The end is computed in 64 bits, so a section declared to wrap past `u32::MAX` simply
    /// covers everything up to the top of the address space.
    #[must_use]
    pub fn contains_rva(&self, rva: u32) -> bool {
        let start = u64::from(self.virtual_address);
        let end = start + u64::from(self.effective_virtual_size());
        let rva = u64::from(rva);

        rva >= start && rva < end
    }
}

/// Decodes a fixed-width name field: everything up to the first NUL, lossily as UTF-8.
fn decode_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|byte| *byte == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Ordered sequence of section headers in on-disk order.
///
/// Entries are never sorted or deduplicated. Lookups scan in table order and the first match
/// wins, which makes later entries with a duplicate name reachable only by number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionTable {
    headers: Vec<SectionHeaderEntry>,
}

impl SectionTable {
    /// Creates a table from headers in on-disk order.
    #[must_use]
    pub fn new(headers: Vec<SectionHeaderEntry>) -> Self {
        SectionTable { headers }
    }

    /// Converts the section headers decoded by goblin, numbering them from 1.
    #[must_use]
    pub fn from_goblin(sections: &[GoblinSection]) -> Self {
        let headers = sections
            .iter()
            .enumerate()
            .map(|(index, section)| SectionHeaderEntry::from_goblin(section, index + 1))
            .collect();

        SectionTable { headers }
    }

    /// All headers in table order.
    #[must_use]
    pub fn headers(&self) -> &[SectionHeaderEntry] {
        &self.headers
    }

    /// Iterates the headers in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, SectionHeaderEntry> {
        self.headers.iter()
    }

    /// Number of headers in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns `true` if the table holds no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// First header whose name equals `name` exactly.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&SectionHeaderEntry> {
        self.headers.iter().find(|header| header.name == name)
    }

    /// Header at the 1-based position `number`.
    ///
    /// # Errors
    /// Returns [`crate::Error::SectionIndexOutOfRange`] unless `1 <= number <= len()`.
    pub fn get(&self, number: usize) -> Result<&SectionHeaderEntry> {
        number
            .checked_sub(1)
            .and_then(|index| self.headers.get(index))
            .ok_or(Error::SectionIndexOutOfRange {
                index: number,
                count: self.headers.len(),
            })
    }

    /// First header, in table order, whose virtual range contains `rva`.
    #[must_use]
    pub fn find_by_rva(&self, rva: u32) -> Option<&SectionHeaderEntry> {
        self.headers.iter().find(|header| header.contains_rva(rva))
    }
}

impl<'a> IntoIterator for &'a SectionTable {
    type Item = &'a SectionHeaderEntry;
    type IntoIter = std::slice::Iter<'a, SectionHeaderEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.iter()
    }
}
