//! The section loader: address resolution, section reads and the special-section dispatcher.

use log::debug;

use crate::{
    file::File,
    headers::{DataDirectoryKey, OptionalHeader, SectionHeaderEntry, SectionTable},
    sections::{
        DirectoryWindow, ExportSection, ImportSection, LoaderConfig, PeSection, ResourceSection,
        RvaSource, SpecialSection,
    },
    Error, PeData, Result,
};

/// Resolves RVAs and data directories of one sample and loads section content.
///
/// The loader borrows the section table, optional header and file of a sample and keeps no
/// other state than its [`LoaderConfig`]. Lookups scan the section table in on-disk order and
/// the first matching section wins. An RVA contained in no section is unresolved, which is
/// reported as `None` and is different from a resolved offset of zero.
///
/// Two kinds of failure are kept apart. Asking for a section name or number the table does not
/// contain is a caller error and returns [`crate::Error`]. Anything the file itself gets wrong
/// (missing or dangling directories, sizes beyond the end of the file, broken tables) yields
/// `None` or a shortened read.
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::{PeData, SectionLoader};
/// use std::path::Path;
///
/// let pe = PeData::from_file(Path::new("sample.exe"))?;
/// let loader = SectionLoader::from_parts(pe.section_table(), pe.optional_header(), pe.file());
///
/// let text = loader.load_section(".text")?;
/// println!("read {} of {} declared bytes", text.len(), text.header().size_of_raw_data);
///
/// if let Some(resources) = loader.load_resource_section() {
///     println!("{} resources", resources.leaves().len());
/// }
/// # Ok::<(), pescope::Error>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct SectionLoader<'a> {
    section_table: &'a SectionTable,
    optional_header: &'a OptionalHeader,
    file: &'a File,
    config: LoaderConfig,
}

impl<'a> SectionLoader<'a> {
    /// Creates a loader over a loaded sample.
    #[must_use]
    pub fn new(pe: &'a PeData) -> Self {
        Self::from_parts(pe.section_table(), pe.optional_header(), pe.file())
    }

    /// Creates a loader from the three parts of a sample.
    ///
    /// Equivalent to [`SectionLoader::new`] over a [`PeData`] holding the same parts.
    #[must_use]
    pub fn from_parts(
        section_table: &'a SectionTable,
        optional_header: &'a OptionalHeader,
        file: &'a File,
    ) -> Self {
        SectionLoader {
            section_table,
            optional_header,
            file,
            config: LoaderConfig::default(),
        }
    }

    /// Replaces the limits used by the special-section parsers.
    #[must_use]
    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// The limits used by the special-section parsers.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The section table this loader resolves against.
    #[must_use]
    pub fn section_table(&self) -> &'a SectionTable {
        self.section_table
    }

    /// The optional header this loader reads data directories from.
    #[must_use]
    pub fn optional_header(&self) -> &'a OptionalHeader {
        self.optional_header
    }

    /// The file this loader reads from.
    #[must_use]
    pub fn file(&self) -> &'a File {
        self.file
    }

    /// Translates an RVA into a file offset.
    ///
    /// The offset is `pointer_to_raw_data + (rva - virtual_address)` of the first section
    /// containing `rva`. It is not checked against the file size; use
    /// [`RvaSource::slice_at_rva`] for a bounded read.
    #[must_use]
    pub fn file_offset(&self, rva: u32) -> Option<u64> {
        let header = self.section_header_by_rva(rva)?;

        Some(u64::from(header.pointer_to_raw_data) + u64::from(rva - header.virtual_address))
    }

    /// Translates the RVA of a data directory into a file offset.
    ///
    /// `None` if the directory is not declared or its RVA lies in no section.
    #[must_use]
    pub fn file_offset_for(&self, key: DataDirectoryKey) -> Option<u64> {
        let directory = self.optional_header.data_directory(key)?;
        self.file_offset(directory.virtual_address)
    }

    /// Translates an absolute virtual address into a file offset.
    ///
    /// `None` if `va` lies below the image base or its RVA does not resolve.
    #[must_use]
    pub fn va_to_offset(&self, va: u64) -> Option<u64> {
        let rva = va.checked_sub(self.optional_header.image_base)?;
        self.file_offset(u32::try_from(rva).ok()?)
    }

    /// Translates a file offset back into an RVA.
    ///
    /// Only the part of each section's raw data that is both present in the file and mapped
    /// into memory is considered. The first such section containing `offset` wins.
    #[must_use]
    pub fn rva_for_offset(&self, offset: u64) -> Option<u32> {
        self.section_table.iter().find_map(|header| {
            if header.pointer_to_raw_data == 0 {
                return None;
            }

            let start = u64::from(header.pointer_to_raw_data);
            let delta = offset.checked_sub(start)?;
            if delta >= self.read_size(header)
                || delta >= u64::from(header.effective_virtual_size())
            {
                return None;
            }

            u32::try_from(u64::from(header.virtual_address) + delta).ok()
        })
    }

    /// The first section, in table order, whose virtual range contains `rva`.
    #[must_use]
    pub fn section_header_by_rva(&self, rva: u32) -> Option<&'a SectionHeaderEntry> {
        self.section_table.find_by_rva(rva)
    }

    /// The first section, in table order, named exactly `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::SectionNotFound`] if no section carries that name.
    pub fn section_header_by_name(&self, name: &str) -> Result<&'a SectionHeaderEntry> {
        self.section_table
            .find_by_name(name)
            .ok_or_else(|| Error::SectionNotFound(name.to_string()))
    }

    /// The section at 1-based position `number`.
    ///
    /// # Errors
    /// Returns [`crate::Error::SectionIndexOutOfRange`] unless `1 <= number <= count`.
    pub fn section_header_by_number(&self, number: usize) -> Result<&'a SectionHeaderEntry> {
        self.section_table.get(number)
    }

    /// The section a data directory lives in.
    #[must_use]
    pub fn section_header_for(&self, key: DataDirectoryKey) -> Option<&'a SectionHeaderEntry> {
        let directory = self.optional_header.data_directory(key)?;
        self.section_header_by_rva(directory.virtual_address)
    }

    /// The section holding the entry point.
    ///
    /// `None` if the entry point lies in no section, which includes images whose entry point
    /// is in the headers.
    #[must_use]
    pub fn entry_point_section(&self) -> Option<&'a SectionHeaderEntry> {
        self.section_header_by_rva(self.optional_header.address_of_entry_point)
    }

    /// Number of bytes that can actually be read for a section.
    ///
    /// This is the declared raw size, clipped to the bytes between `pointer_to_raw_data` and the
    /// end of the file. It is zero if the section has no raw data or its pointer is at or past
    /// the end of the file.
    #[must_use]
    pub fn read_size(&self, header: &SectionHeaderEntry) -> u64 {
        if header.pointer_to_raw_data == 0 {
            return 0;
        }

        let available = self
            .file
            .file_size()
            .saturating_sub(u64::from(header.pointer_to_raw_data));
        u64::from(header.size_of_raw_data).min(available)
    }

    /// Loads the content of the first section named `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::SectionNotFound`] if no section carries that name.
    pub fn load_section(&self, name: &str) -> Result<PeSection<'a>> {
        let header = self.section_header_by_name(name)?;
        Ok(self.read_section(header))
    }

    /// Loads the content of the section at 1-based position `number`.
    ///
    /// # Errors
    /// Returns [`crate::Error::SectionIndexOutOfRange`] unless `1 <= number <= count`.
    pub fn load_section_by_number(&self, number: usize) -> Result<PeSection<'a>> {
        let header = self.section_header_by_number(number)?;
        Ok(self.read_section(header))
    }

    /// Loads the whole section a data directory lives in.
    #[must_use]
    pub fn load_section_for(&self, key: DataDirectoryKey) -> Option<PeSection<'a>> {
        self.section_header_for(key)
            .map(|header| self.read_section(header))
    }

    /// Loads the first section whose virtual range contains `rva`.
    #[must_use]
    pub fn load_section_containing(&self, rva: u32) -> Option<PeSection<'a>> {
        self.section_header_by_rva(rva)
            .map(|header| self.read_section(header))
    }

    fn read_section(&self, header: &'a SectionHeaderEntry) -> PeSection<'a> {
        let size = self.read_size(header);
        if header.pointer_to_raw_data != 0 && size < u64::from(header.size_of_raw_data) {
            debug!(
                "Section {} '{}' declares {:#x} raw bytes, only {:#x} present",
                header.number, header.name, header.size_of_raw_data, size
            );
        }

        let data = self
            .file
            .read_clipped(u64::from(header.pointer_to_raw_data), size);
        PeSection::new(header, data)
    }

    /// The clipped bytes of a data directory.
    ///
    /// The window starts at the directory's file offset and is `min(size, file_size - offset)`
    /// bytes long; it is empty if the offset lies at or past the end of the file. `None` if the
    /// directory is not declared or its RVA lies in no section.
    #[must_use]
    pub fn directory_window(&self, key: DataDirectoryKey) -> Option<DirectoryWindow<'a>> {
        let directory = self.optional_header.data_directory(key)?;
        let Some(offset) = self.file_offset(directory.virtual_address) else {
            debug!(
                "{:?} directory RVA {:#x} is not inside any section",
                key, directory.virtual_address
            );
            return None;
        };

        let data = self.file.read_clipped(offset, u64::from(directory.size));
        if data.len() as u64 != u64::from(directory.size) {
            debug!(
                "{:?} directory clipped from {:#x} to {:#x} bytes at offset {:#x}",
                key,
                directory.size,
                data.len(),
                offset
            );
        }

        Some(DirectoryWindow {
            rva: directory.virtual_address,
            data,
        })
    }

    /// Hands the directory `T` decodes to its parser.
    ///
    /// `None` if the directory is not declared, does not resolve, or the parser rejects it.
    #[must_use]
    pub fn load_special<T: SpecialSection>(&self) -> Option<T> {
        let window = self.directory_window(T::KEY)?;

        match T::parse(&window, self, &self.config) {
            Ok(section) => Some(section),
            Err(error) => {
                debug!(
                    "{:?} directory at RVA {:#x} could not be parsed: {}",
                    T::KEY,
                    window.rva,
                    error
                );
                None
            }
        }
    }

    /// Parses the export directory.
    #[must_use]
    pub fn load_export_section(&self) -> Option<ExportSection> {
        self.load_special::<ExportSection>()
    }

    /// Parses the import directory.
    #[must_use]
    pub fn load_import_section(&self) -> Option<ImportSection> {
        self.load_special::<ImportSection>()
    }

    /// Parses the resource directory.
    #[must_use]
    pub fn load_resource_section(&self) -> Option<ResourceSection> {
        self.load_special::<ResourceSection>()
    }
}

impl RvaSource for SectionLoader<'_> {
    fn slice_at_rva(&self, rva: u32, len: usize) -> Option<&[u8]> {
        let offset = self.file_offset(rva)?;
        if offset >= self.file.file_size() {
            return None;
        }

        Some(
            self.file
                .read_clipped(offset, u64::try_from(len).unwrap_or(u64::MAX)),
        )
    }

    fn is_pe32_plus(&self) -> bool {
        self.optional_header.is_pe32_plus()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        headers::{DataDirectoryKey, SectionHeaderEntry},
        Error,
    };

    const FILE_SIZE: usize = 0x600;

    // .text  va 0x1000 vs 0x200  raw 0x200 @ 0x200
    // .data  va 0x2000 vs 0x100  raw 0x400 @ 0x400  (raw data runs past the end of the file)
    // .bss   va 0x3000 vs 0x80   no raw data
    // .ovl   va 0x4000 vs 0x100  raw 0x100 @ 0x800  (pointer past the end of the file)
    fn parts() -> (SectionTable, OptionalHeader, File) {
        let table = SectionTable::new(vec![
            SectionHeaderEntry::new(".text", 1, 0x1000, 0x200, 0x200, 0x200, 0x6000_0020),
            SectionHeaderEntry::new(".data", 2, 0x2000, 0x100, 0x400, 0x400, 0xC000_0040),
            SectionHeaderEntry::new(".bss", 3, 0x3000, 0x80, 0, 0, 0xC000_0080),
            SectionHeaderEntry::new(".ovl", 4, 0x4000, 0x100, 0x800, 0x100, 0x4000_0040),
        ]);
        let optional = OptionalHeader::default()
            .with_entry_point(0x1010)
            .with_directory(DataDirectoryKey::ImportTable, 0x2010, 0x28)
            .with_directory(DataDirectoryKey::ResourceTable, 0x2080, 0x1000)
            .with_directory(DataDirectoryKey::ExportTable, 0x9000, 0x40)
            .with_directory(DataDirectoryKey::Debug, 0x4000, 0x1C);
        let data: Vec<u8> = (0..FILE_SIZE).map(|i| (i % 251) as u8).collect();
        let file = File::from_mem(data).unwrap();

        (table, optional, file)
    }

    #[test]
    fn file_offset_resolves_inside_sections() {
        let (table, optional, file) = parts();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        assert_eq!(loader.file_offset(0x1000), Some(0x200));
        assert_eq!(loader.file_offset(0x11FF), Some(0x3FF));
        assert_eq!(loader.file_offset(0x2050), Some(0x450));
        assert_eq!(loader.file_offset(0x3000), Some(0));
        assert_eq!(loader.file_offset(0x1200), None);
        assert_eq!(loader.file_offset(0x0), None);
    }

    #[test]
    fn first_overlapping_section_wins() {
        let table = SectionTable::new(vec![
            SectionHeaderEntry::new("A", 1, 0x1000, 0x1000, 0x200, 0x200, 0),
            SectionHeaderEntry::new("B", 2, 0x1800, 0x1000, 0x400, 0x200, 0),
        ]);
        let optional = OptionalHeader::default();
        let file = File::from_mem(vec![0; 0x800]).unwrap();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        assert_eq!(loader.section_header_by_rva(0x1900).unwrap().name, "A");
        assert_eq!(loader.file_offset(0x1900), Some(0x200 + 0x900));
        assert_eq!(loader.section_header_by_rva(0x2000).unwrap().name, "B");
    }

    #[test]
    fn zero_virtual_size_falls_back_to_raw_size() {
        let table = SectionTable::new(vec![SectionHeaderEntry::new(
            "UPX1", 1, 0x1000, 0, 0x200, 0x100, 0,
        )]);
        let optional = OptionalHeader::default();
        let file = File::from_mem(vec![0; 0x400]).unwrap();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        assert_eq!(loader.file_offset(0x10FF), Some(0x2FF));
        assert_eq!(loader.file_offset(0x1100), None);
    }

    #[test]
    fn lookup_by_name_and_number() {
        let (table, optional, file) = parts();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        assert_eq!(loader.section_header_by_name(".bss").unwrap().number, 3);
        assert!(matches!(
            loader.section_header_by_name(".reloc"),
            Err(Error::SectionNotFound(name)) if name == ".reloc"
        ));

        for number in 1..=table.len() {
            assert_eq!(loader.section_header_by_number(number).unwrap().number, number);
        }
        assert!(matches!(
            loader.section_header_by_number(0),
            Err(Error::SectionIndexOutOfRange { index: 0, count: 4 })
        ));
        assert!(matches!(
            loader.section_header_by_number(5),
            Err(Error::SectionIndexOutOfRange { index: 5, count: 4 })
        ));
    }

    #[test]
    fn read_size_is_clipped() {
        let (table, optional, file) = parts();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        let sizes: Vec<u64> = table.iter().map(|h| loader.read_size(h)).collect();
        assert_eq!(sizes, vec![0x200, 0x200, 0, 0]);

        for header in &table {
            let size = loader.read_size(header);
            assert!(size <= u64::from(header.size_of_raw_data));
            assert!(size <= (FILE_SIZE as u64).saturating_sub(u64::from(header.pointer_to_raw_data)));
        }
    }

    #[test]
    fn load_section_truncates_to_file() {
        let (table, optional, file) = parts();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        let data = loader.load_section(".data").unwrap();
        assert_eq!(data.len(), 0x200);
        assert_eq!(data.data(), &file.data()[0x400..0x600]);
        assert_eq!(data.header().number, 2);

        assert!(loader.load_section(".bss").unwrap().is_empty());
        assert!(loader.load_section_by_number(4).unwrap().is_empty());
        assert!(loader.load_section(".idata").is_err());
        assert!(loader.load_section_by_number(9).is_err());
    }

    #[test]
    fn load_section_length_matches_read_size() {
        let (table, optional, file) = parts();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        for header in &table {
            let by_name = loader.load_section(&header.name).unwrap();
            let by_number = loader.load_section_by_number(header.number).unwrap();
            assert_eq!(by_name.len() as u64, loader.read_size(header));
            assert_eq!(by_number.data(), by_name.data());
        }
    }

    #[test]
    fn duplicate_names_resolve_to_first() {
        let table = SectionTable::new(vec![
            SectionHeaderEntry::new(".text", 1, 0x1000, 0x100, 0x200, 0x100, 0),
            SectionHeaderEntry::new(".text", 2, 0x2000, 0x100, 0x300, 0x100, 0),
        ]);
        let optional = OptionalHeader::default();
        let file = File::from_mem(vec![0; 0x400]).unwrap();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        assert_eq!(loader.load_section(".text").unwrap().header().number, 1);
        assert_eq!(
            loader.load_section_by_number(2).unwrap().header().virtual_address,
            0x2000
        );
    }

    #[test]
    fn directory_lookups() {
        let (table, optional, file) = parts();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        assert_eq!(loader.file_offset_for(DataDirectoryKey::ImportTable), Some(0x410));
        assert_eq!(loader.file_offset_for(DataDirectoryKey::ExportTable), None);
        assert_eq!(loader.file_offset_for(DataDirectoryKey::TlsTable), None);
        assert_eq!(
            loader.section_header_for(DataDirectoryKey::ImportTable).unwrap().name,
            ".data"
        );
        assert!(loader.section_header_for(DataDirectoryKey::ExportTable).is_none());
        assert_eq!(
            loader.load_section_for(DataDirectoryKey::ImportTable).unwrap().len(),
            0x200
        );
        assert_eq!(loader.entry_point_section().unwrap().name, ".text");
    }

    #[test]
    fn directory_window_is_clipped() {
        let (table, optional, file) = parts();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        let import = loader.directory_window(DataDirectoryKey::ImportTable).unwrap();
        assert_eq!(import.rva, 0x2010);
        assert_eq!(import.data, &file.data()[0x410..0x438]);

        let resource = loader.directory_window(DataDirectoryKey::ResourceTable).unwrap();
        assert_eq!(resource.data.len(), FILE_SIZE - 0x480);

        // Resolves to offset 0x800, beyond the file.
        let debug = loader.directory_window(DataDirectoryKey::Debug).unwrap();
        assert!(debug.data.is_empty());

        assert!(loader.directory_window(DataDirectoryKey::ExportTable).is_none());
        assert!(loader.directory_window(DataDirectoryKey::Iat).is_none());
    }

    #[test]
    fn virtual_and_raw_address_translation() {
        let (table, optional, file) = parts();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        assert_eq!(loader.va_to_offset(0x0040_1004), Some(0x204));
        assert_eq!(loader.va_to_offset(0x1004), None);
        assert_eq!(loader.va_to_offset(0x0040_0000 + 0x1_0000_0000), None);

        assert_eq!(loader.rva_for_offset(0x204), Some(0x1004));
        assert_eq!(loader.rva_for_offset(0x4FF), Some(0x20FF));
        // Raw bytes beyond the virtual size of .data are not mapped.
        assert_eq!(loader.rva_for_offset(0x500), None);
        assert_eq!(loader.rva_for_offset(0x100), None);
        assert_eq!(loader.rva_for_offset(0x900), None);

        for offset in [0x200u64, 0x2AB, 0x3FF, 0x400, 0x47F] {
            let rva = loader.rva_for_offset(offset).unwrap();
            assert_eq!(loader.file_offset(rva), Some(offset));
        }
    }

    #[test]
    fn rva_source_is_clipped_to_file() {
        let (table, optional, file) = parts();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        assert_eq!(loader.slice_at_rva(0x1000, 4), Some(&file.data()[0x200..0x204]));
        assert_eq!(loader.slice_at_rva(0x20F0, 0x1000).unwrap().len(), 0x110);
        assert_eq!(loader.slice_at_rva(0x4000, 4), None);
        assert_eq!(loader.slice_at_rva(0x5000, 4), None);
        assert!(!loader.is_pe32_plus());
    }

    struct AlwaysBroken;

    impl SpecialSection for AlwaysBroken {
        const KEY: DataDirectoryKey = DataDirectoryKey::ImportTable;

        fn parse(
            _window: &DirectoryWindow<'_>,
            _source: &dyn RvaSource,
            _config: &LoaderConfig,
        ) -> Result<Self> {
            Err(malformed_error!("broken on purpose"))
        }
    }

    struct WindowLength(usize);

    impl SpecialSection for WindowLength {
        const KEY: DataDirectoryKey = DataDirectoryKey::ResourceTable;

        fn parse(
            window: &DirectoryWindow<'_>,
            _source: &dyn RvaSource,
            config: &LoaderConfig,
        ) -> Result<Self> {
            Ok(WindowLength(window.data.len().min(config.max_resource_entries)))
        }
    }

    #[test]
    fn dispatcher_converts_failures_to_absent() {
        let (table, optional, file) = parts();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        assert!(loader.load_special::<AlwaysBroken>().is_none());
        assert_eq!(
            loader.load_special::<WindowLength>().map(|w| w.0),
            Some(FILE_SIZE - 0x480)
        );

        let config = LoaderConfig {
            max_resource_entries: 7,
            ..LoaderConfig::default()
        };
        let limited = loader.with_config(config);
        assert_eq!(limited.config().max_resource_entries, 7);
        assert_eq!(limited.load_special::<WindowLength>().map(|w| w.0), Some(7));
    }

    #[test]
    fn absent_directories_are_not_errors() {
        let (table, _, file) = parts();
        let optional = OptionalHeader::default();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        assert!(loader.load_export_section().is_none());
        assert!(loader.load_import_section().is_none());
        assert!(loader.load_resource_section().is_none());
    }

    #[test]
    fn construction_paths_agree() {
        let (table, optional, file) = parts();
        let pe = PeData::new(file, table, optional);

        let from_pe = SectionLoader::new(&pe);
        let from_parts = SectionLoader::from_parts(pe.section_table(), pe.optional_header(), pe.file());

        for key in crate::headers::DATA_DIRECTORY_KEYS {
            assert_eq!(from_pe.file_offset_for(key), from_parts.file_offset_for(key));
            assert_eq!(from_pe.directory_window(key), from_parts.directory_window(key));
        }
    }

    #[test]
    fn loader_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SectionLoader<'_>>();

        let (table, optional, file) = parts();
        let loader = SectionLoader::from_parts(&table, &optional, &file);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4u32)
                .map(|worker| {
                    scope.spawn(move || {
                        (0..0x200u32)
                            .map(|i| loader.file_offset(0x1000 + i).map(|o| o + u64::from(worker)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            for (worker, handle) in handles.into_iter().enumerate() {
                let offsets = handle.join().unwrap();
                assert_eq!(offsets[0], Some(0x200 + worker as u64));
                assert_eq!(offsets[0x1FF], Some(0x3FF + worker as u64));
            }
        });
    }
}
