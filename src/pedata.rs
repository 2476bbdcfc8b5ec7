//! Loaded PE sample: file bytes plus the decoded headers the section loader needs.
//!
//! Header decoding is delegated to `goblin`. Only the headers are decoded eagerly; goblin's
//! import, export and resource parsing is deliberately not used, because a single broken table
//! would make the whole sample fail to load. Those tables are parsed on demand through
//! [`crate::sections::SectionLoader`], where failures are reported as absent sections.

use std::path::Path;

use goblin::pe::header::{Header, SIZEOF_COFF_HEADER, SIZEOF_PE_MAGIC};
use log::debug;

use crate::{
    file::{io::read_le, File},
    headers::{OptionalHeader, SectionTable, PE32_PLUS_MAGIC},
    sections::SectionLoader,
    Result,
};

/// Number of data directories the format defines; larger declared counts are clamped.
const MAX_DATA_DIRECTORIES: u32 = 16;
/// Offset of `e_lfanew` in the DOS header
const PE_POINTER_OFFSET: usize = 0x3C;
/// Offset of `NumberOfRvaAndSizes` in a PE32 optional header
const RVA_COUNT_OFFSET_PE32: usize = 92;
/// Offset of `NumberOfRvaAndSizes` in a PE32+ optional header
const RVA_COUNT_OFFSET_PE32_PLUS: usize = 108;

/// The COFF file header fields kept after decoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoffSummary {
    /// Target machine type
    pub machine: u16,
    /// Number of section headers the COFF header declares
    pub number_of_sections: u16,
    /// Link time as seconds since the Unix epoch
    pub time_date_stamp: u32,
    /// Image characteristics flags
    pub characteristics: u16,
}

/// A loaded PE sample.
///
/// `PeData` owns the [`File`] and the decoded [`SectionTable`] and [`OptionalHeader`]. All of
/// them are immutable after construction; a [`SectionLoader`] borrows them to answer queries.
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::{headers::DataDirectoryKey, PeData};
/// use std::path::Path;
///
/// let pe = PeData::from_file(Path::new("sample.exe"))?;
/// println!("{} sections", pe.section_table().len());
///
/// let loader = pe.loader();
/// match loader.file_offset_for(DataDirectoryKey::ImportTable) {
///     Some(offset) => println!("imports at file offset {offset:#x}"),
///     None => println!("no resolvable import directory"),
/// }
/// # Ok::<(), pescope::Error>(())
/// ```
#[derive(Debug)]
pub struct PeData {
    file: File,
    section_table: SectionTable,
    optional_header: OptionalHeader,
    coff: CoffSummary,
}

impl PeData {
    /// Memory-maps the file at `path` and decodes its headers.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be mapped, [`crate::Error::Empty`]
    /// for an empty file, and the errors of [`PeData::from_pe_file`].
    pub fn from_file(path: &Path) -> Result<PeData> {
        Self::from_pe_file(File::from_file(path)?)
    }

    /// Decodes the headers of a sample already held in memory.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer, and the errors of
    /// [`PeData::from_pe_file`].
    pub fn from_mem(data: Vec<u8>) -> Result<PeData> {
        Self::from_pe_file(File::from_mem(data)?)
    }

    /// Decodes the headers of `file`.
    ///
    /// # Errors
    /// - [`crate::Error::GoblinErr`] if the DOS, COFF or optional header, or the section
    ///   table, cannot be decoded
    /// - [`crate::Error::Malformed`] if the image has no optional header
    pub fn from_pe_file(file: File) -> Result<PeData> {
        let clamped = clamp_directory_count(file.data());
        let bytes = clamped.as_deref().unwrap_or(file.data());
        let header = Header::parse(bytes)?;

        let Some(optional) = header.optional_header.as_ref() else {
            return Err(malformed_error!("File does not have an OptionalHeader"));
        };
        let optional_header = OptionalHeader::from_goblin(optional)?;

        let mut offset = usize::try_from(header.dos_header.pe_pointer)
            .ok()
            .and_then(|pe_pointer| pe_pointer.checked_add(SIZEOF_PE_MAGIC + SIZEOF_COFF_HEADER))
            .and_then(|start| {
                start.checked_add(usize::from(header.coff_header.size_of_optional_header))
            })
            .ok_or_else(|| malformed_error!("Section table offset overflows"))?;
        let sections = header.coff_header.sections(bytes, &mut offset)?;
        let section_table = SectionTable::from_goblin(&sections);

        debug!(
            "Decoded {} section headers, {} data directories",
            section_table.len(),
            optional_header.directories().count()
        );

        let coff = CoffSummary {
            machine: header.coff_header.machine,
            number_of_sections: header.coff_header.number_of_sections,
            time_date_stamp: header.coff_header.time_date_stamp,
            characteristics: header.coff_header.characteristics,
        };

        Ok(PeData {
            file,
            section_table,
            optional_header,
            coff,
        })
    }

    /// Assembles a sample from headers decoded elsewhere.
    ///
    /// The COFF summary is derived from the section table.
    #[must_use]
    pub fn new(file: File, section_table: SectionTable, optional_header: OptionalHeader) -> Self {
        let coff = CoffSummary {
            number_of_sections: u16::try_from(section_table.len()).unwrap_or(u16::MAX),
            ..CoffSummary::default()
        };

        PeData {
            file,
            section_table,
            optional_header,
            coff,
        }
    }

    /// The bytes of the sample.
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// The section table in on-disk order.
    #[must_use]
    pub fn section_table(&self) -> &SectionTable {
        &self.section_table
    }

    /// The decoded optional header.
    #[must_use]
    pub fn optional_header(&self) -> &OptionalHeader {
        &self.optional_header
    }

    /// The COFF file header fields.
    #[must_use]
    pub fn coff(&self) -> &CoffSummary {
        &self.coff
    }

    /// A [`SectionLoader`] over this sample with the default configuration.
    #[must_use]
    pub fn loader(&self) -> SectionLoader<'_> {
        SectionLoader::new(self)
    }
}

/// Returns a copy of `bytes` with `NumberOfRvaAndSizes` lowered to 16, or `None` if the
/// declared count is already in range or the field cannot be located.
///
/// The Windows loader ignores directories past the sixteenth; goblin rejects the header.
fn clamp_directory_count(bytes: &[u8]) -> Option<Vec<u8>> {
    let pe_pointer = usize::try_from(read_le::<u32>(bytes.get(PE_POINTER_OFFSET..)?).ok()?).ok()?;
    let optional = pe_pointer.checked_add(SIZEOF_PE_MAGIC + SIZEOF_COFF_HEADER)?;
    let magic = read_le::<u16>(bytes.get(optional..)?).ok()?;
    let field = optional.checked_add(if magic == PE32_PLUS_MAGIC {
        RVA_COUNT_OFFSET_PE32_PLUS
    } else {
        RVA_COUNT_OFFSET_PE32
    })?;

    let count = read_le::<u32>(bytes.get(field..)?).ok()?;
    if count <= MAX_DATA_DIRECTORIES {
        return None;
    }

    debug!("NumberOfRvaAndSizes {count} clamped to {MAX_DATA_DIRECTORIES}");
    let mut patched = bytes.to_vec();
    patched
        .get_mut(field..field + 4)?
        .copy_from_slice(&MAX_DATA_DIRECTORIES.to_le_bytes());
    Some(patched)
}
