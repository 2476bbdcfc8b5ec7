use std::collections::BTreeMap;

use goblin::pe::optional_header::OptionalHeader as GoblinOptionalHeader;

use crate::{
    headers::{DataDirectoryEntry, DataDirectoryKey, DllCharacteristic},
    Result,
};

/// Optional header magic of 32-bit images
pub const PE32_MAGIC: u16 = 0x10b;
/// Optional header magic of 64-bit images
pub const PE32_PLUS_MAGIC: u16 = 0x20b;

/// The optional header fields the section loader consumes, plus the data directory map.
///
/// Values are copied out of goblin's decoded header once and never change afterwards. The
/// data directory map only holds directories the file actually declares; a directory whose
/// RVA and size are both zero is not present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionalHeader {
    /// `0x10b` for PE32, `0x20b` for PE32+
    pub magic: u16,
    /// RVA of the entry point, zero when the image has none
    pub address_of_entry_point: u32,
    /// Preferred load address
    pub image_base: u64,
    /// In-memory alignment of sections
    pub section_alignment: u32,
    /// On-disk alignment of section data
    pub file_alignment: u32,
    /// Declared size of the mapped image
    pub size_of_image: u32,
    /// Declared size of all headers
    pub size_of_headers: u32,
    /// Windows subsystem required to run the image
    pub subsystem: u16,
    /// Raw `DllCharacteristics` word
    pub dll_characteristics: u16,
    directories: BTreeMap<DataDirectoryKey, DataDirectoryEntry>,
}

impl Default for OptionalHeader {
    fn default() -> Self {
        OptionalHeader {
            magic: PE32_MAGIC,
            address_of_entry_point: 0,
            image_base: 0x0040_0000,
            section_alignment: 0x1000,
            file_alignment: 0x200,
            size_of_image: 0,
            size_of_headers: 0,
            subsystem: 0,
            dll_characteristics: 0,
            directories: BTreeMap::new(),
        }
    }
}

impl OptionalHeader {
    /// Copies the consumed fields out of a header decoded by goblin.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry point does not fit into 32 bits.
    pub fn from_goblin(header: &GoblinOptionalHeader) -> Result<Self> {
        let standard = &header.standard_fields;
        let windows = &header.windows_fields;

        let address_of_entry_point =
            u32::try_from(standard.address_of_entry_point).map_err(|_| {
                malformed_error!(
                    "Entry point does not fit into 32 bits - {:#x}",
                    standard.address_of_entry_point
                )
            })?;

        let mut directories = BTreeMap::new();
        for (dir_type, directory) in header.data_directories.dirs() {
            let Some(key) = DataDirectoryKey::from_index(dir_type as usize) else {
                continue;
            };
            if directory.virtual_address == 0 && directory.size == 0 {
                continue;
            }

            directories.insert(
                key,
                DataDirectoryEntry::new(key, directory.virtual_address, directory.size),
            );
        }

        Ok(OptionalHeader {
            magic: standard.magic,
            address_of_entry_point,
            image_base: windows.image_base,
            section_alignment: windows.section_alignment,
            file_alignment: windows.file_alignment,
            size_of_image: windows.size_of_image,
            size_of_headers: windows.size_of_headers,
            subsystem: windows.subsystem,
            dll_characteristics: windows.dll_characteristics,
            directories,
        })
    }

    /// Returns `true` for PE32+ (64-bit) images.
    #[must_use]
    pub fn is_pe32_plus(&self) -> bool {
        self.magic == PE32_PLUS_MAGIC
    }

    /// Decodes [`OptionalHeader::dll_characteristics`] into its variants.
    #[must_use]
    pub fn dll_characteristic_flags(&self) -> Vec<DllCharacteristic> {
        DllCharacteristic::from_raw(self.dll_characteristics)
    }

    /// Looks up a data directory; `None` when the header does not declare it.
    #[must_use]
    pub fn data_directory(&self, key: DataDirectoryKey) -> Option<&DataDirectoryEntry> {
        self.directories.get(&key)
    }

    /// Iterates the declared data directories in directory-array order.
    pub fn directories(&self) -> impl Iterator<Item = &DataDirectoryEntry> {
        self.directories.values()
    }

    /// Returns a copy with the entry point at `rva`.
    #[must_use]
    pub fn with_entry_point(mut self, rva: u32) -> Self {
        self.address_of_entry_point = rva;
        self
    }

    /// Returns a copy with `key` declared at `(virtual_address, size)`.
    #[must_use]
    pub fn with_directory(mut self, key: DataDirectoryKey, virtual_address: u32, size: u32) -> Self {
        self.directories
            .insert(key, DataDirectoryEntry::new(key, virtual_address, size));
        self
    }

    /// Returns a copy without a declaration for `key`.
    #[must_use]
    pub fn without_directory(mut self, key: DataDirectoryKey) -> Self {
        self.directories.remove(&key);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_map() {
        let header = OptionalHeader::default()
            .with_directory(DataDirectoryKey::ResourceTable, 0x3000, 0x100)
            .with_directory(DataDirectoryKey::ImportTable, 0x2000, 0x28);

        let import = header.data_directory(DataDirectoryKey::ImportTable).unwrap();
        assert_eq!(import.virtual_address, 0x2000);
        assert_eq!(import.size, 0x28);
        assert!(header.data_directory(DataDirectoryKey::ExportTable).is_none());

        let keys: Vec<_> = header.directories().map(|entry| entry.key).collect();
        assert_eq!(
            keys,
            vec![DataDirectoryKey::ImportTable, DataDirectoryKey::ResourceTable]
        );

        let header = header.without_directory(DataDirectoryKey::ImportTable);
        assert!(header.data_directory(DataDirectoryKey::ImportTable).is_none());
    }

    #[test]
    fn builders_keep_directories() {
        let header = OptionalHeader::default()
            .with_directory(DataDirectoryKey::ImportTable, 0x2000, 0x28)
            .with_entry_point(0x1010);

        assert_eq!(header.address_of_entry_point, 0x1010);
        assert!(header.data_directory(DataDirectoryKey::ImportTable).is_some());
    }

    #[test]
    fn pe32_plus() {
        let mut header = OptionalHeader::default();
        assert!(!header.is_pe32_plus());
        header.magic = PE32_PLUS_MAGIC;
        assert!(header.is_pe32_plus());
    }

    #[test]
    fn dll_flags() {
        let header = OptionalHeader {
            dll_characteristics: 0x0140,
            ..OptionalHeader::default()
        };
        assert_eq!(
            header.dll_characteristic_flags(),
            vec![DllCharacteristic::DynamicBase, DllCharacteristic::NxCompat]
        );
    }
}
