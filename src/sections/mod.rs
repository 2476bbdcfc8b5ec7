//! Section and data directory resolution.
//!
//! This module turns the virtual address space a PE header declares into byte ranges of the
//! actual file. Section headers and data directories of hostile samples overlap, declare sizes
//! far beyond the end of the file, or point nowhere at all. The resolution rules here never
//! panic and never read past the file; an address that cannot be resolved is reported as absent.
//!
//! # Architecture
//!
//! The [`crate::sections::SectionLoader`] borrows the three inputs of a loaded sample (section
//! table, optional header, file bytes) and performs all lookups on demand. Nothing is cached:
//! every [`crate::sections::PeSection`] is a view into the file created for a single request.
//!
//! The special-section dispatcher sits on top of the loader. It resolves a data directory to a
//! [`crate::sections::DirectoryWindow`] and hands it to a [`crate::sections::SpecialSection`]
//! parser together with the loader itself as [`crate::sections::RvaSource`], so that parsers can
//! follow pointers that leave the window. A parser failure is converted to an absent result.
//!
//! # Key Components
//!
//! - [`crate::sections::SectionLoader`] - Address resolution, section loading and dispatch
//! - [`crate::sections::LoaderConfig`] - Limits applied while parsing special sections
//! - [`crate::sections::ExportSection`] - Export directory (`.edata`)
//! - [`crate::sections::ImportSection`] - Import directory (`.idata`)
//! - [`crate::sections::ResourceSection`] - Resource directory tree (`.rsrc`)
//!
//! # Examples
//!
//! ```rust,no_run
//! use pescope::PeData;
//! use std::path::Path;
//!
//! let pe = PeData::from_file(Path::new("sample.dll"))?;
//! let loader = pe.loader();
//!
//! for header in pe.section_table() {
//!     let section = loader.load_section_by_number(header.number)?;
//!     println!("{:8} {:#x} bytes", header.name, section.len());
//! }
//!
//! if let Some(imports) = loader.load_import_section() {
//!     for dll in imports.dlls() {
//!         println!("{} ({} imports)", dll.name, dll.entries.len());
//!     }
//! }
//! # Ok::<(), pescope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! All types in this module are immutable after construction and `Send + Sync`.

mod config;
mod edata;
mod idata;
mod loader;
mod rsrc;

pub use config::LoaderConfig;
pub use edata::{ExportEntry, ExportSection};
pub use idata::{ImportEntry, ImportSection, ImportedDll};
pub use loader::SectionLoader;
pub use rsrc::{
    ResourceDataEntry, ResourceDirectory, ResourceEntry, ResourceId, ResourceLeaf, ResourceNode,
    ResourceSection, ResourceType,
};

use crate::{
    headers::{DataDirectoryKey, SectionHeaderEntry},
    Parser, Result,
};

/// The content of one section, as far as the file actually holds it.
///
/// `data` is clipped to the end of the file, so it can be shorter than the declared raw size;
/// its length always equals [`SectionLoader::read_size`] of the header. A section without raw
/// data yields an empty slice.
#[derive(Clone, Copy, Debug)]
pub struct PeSection<'a> {
    header: &'a SectionHeaderEntry,
    data: &'a [u8],
}

impl<'a> PeSection<'a> {
    pub(crate) fn new(header: &'a SectionHeaderEntry, data: &'a [u8]) -> Self {
        PeSection { header, data }
    }

    /// The section header this content was loaded for.
    #[must_use]
    pub fn header(&self) -> &'a SectionHeaderEntry {
        self.header
    }

    /// The bytes read from the file.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Number of bytes read from the file.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no bytes could be read for this section.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the bytes starting at `rva`, if that address lies within the loaded content.
    #[must_use]
    pub fn data_at_rva(&self, rva: u32) -> Option<&'a [u8]> {
        let offset = usize::try_from(rva.checked_sub(self.header.virtual_address)?).ok()?;
        self.data.get(offset..)
    }
}

/// The clipped bytes of one data directory together with the RVA they start at.
///
/// The window never extends past the end of the file; its length is the smaller of the declared
/// directory size and the bytes remaining after the directory's file offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectoryWindow<'a> {
    /// RVA of the first byte of `data`
    pub rva: u32,
    /// The directory bytes read from the file
    pub data: &'a [u8],
}

impl<'a> DirectoryWindow<'a> {
    /// Returns `true` if `rva` falls inside the window.
    #[must_use]
    pub fn contains_rva(&self, rva: u32) -> bool {
        self.offset_of(rva).is_some()
    }

    /// Window-relative offset of `rva`, if it falls inside the window.
    #[must_use]
    pub fn offset_of(&self, rva: u32) -> Option<usize> {
        let offset = usize::try_from(rva.checked_sub(self.rva)?).ok()?;
        (offset < self.data.len()).then_some(offset)
    }

    /// A [`crate::Parser`] over the window, positioned at its start.
    #[must_use]
    pub fn parser(&self) -> Parser<'a> {
        Parser::new(self.data)
    }
}

/// Resolves RVAs to file content for parsers that follow pointers out of their window.
///
/// [`SectionLoader`] is the production implementation.
pub trait RvaSource {
    /// Returns at most `len` bytes of file content starting at `rva`.
    ///
    /// The result is shorter than `len` when the file ends first. `None` means the RVA lies in
    /// no section or its file offset is at or past the end of the file.
    fn slice_at_rva(&self, rva: u32, len: usize) -> Option<&[u8]>;

    /// Returns `true` if the image uses PE32+ (64-bit) table layouts.
    fn is_pe32_plus(&self) -> bool;

    /// Reads a NUL-terminated string of at most `max_len` bytes at `rva`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the RVA cannot be resolved.
    fn read_cstring_at(&self, rva: u32, max_len: usize) -> Result<String> {
        let data = self
            .slice_at_rva(rva, max_len)
            .filter(|data| !data.is_empty())
            .ok_or_else(|| malformed_error!("String RVA {:#x} does not resolve", rva))?;

        Parser::new(data).read_cstring(max_len)
    }
}

/// A table parser the dispatcher can hand a data directory to.
pub trait SpecialSection: Sized {
    /// The data directory this parser decodes.
    const KEY: DataDirectoryKey;

    /// Decodes the directory in `window`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] when the structure
    /// of the table is broken; the dispatcher reports this as an absent section.
    fn parse(window: &DirectoryWindow<'_>, source: &dyn RvaSource, config: &LoaderConfig)
        -> Result<Self>;
}
