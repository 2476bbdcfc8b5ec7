// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # pescope
//!
//! Section and data directory resolution for Portable Executable files that do not play by
//! the rules.
//!
//! The headers of a PE file describe three coordinate systems: the virtual address space of the
//! mapped image, the raw offsets of the file on disk, and the logical list of sections. In
//! well-formed files they agree. In packed binaries and malware they frequently do not: sections
//! overlap, declare zero or enormous sizes, point past the end of the file, or data directories
//! point into nothing. `pescope` resolves these addresses anyway, and reports what cannot be
//! resolved as absent instead of failing or reading the wrong bytes.
//!
//! ## Features
//!
//! - **📦 Zero-copy access** - Memory-mapped input, sections and directory windows are views into the file
//! - **🛡️ Anomaly tolerant** - Every declared size is clipped to the file, unresolvable addresses become `None`
//! - **🔍 Special sections** - Export, import and resource directories decoded on demand
//! - **⚙️ Bounded work** - [`sections::LoaderConfig`] caps what a hostile table can make the parsers do
//! - **🧵 Thread safe** - All loaded data is immutable and `Send + Sync`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pescope::prelude::*;
//! use std::path::Path;
//!
//! let pe = PeData::from_file(Path::new("sample.exe"))?;
//! let loader = pe.loader();
//!
//! for header in pe.section_table() {
//!     println!(
//!         "{:8} rva {:#010x} raw {:#x} / readable {:#x}",
//!         header.name,
//!         header.virtual_address,
//!         header.size_of_raw_data,
//!         loader.read_size(header)
//!     );
//! }
//!
//! if let Some(exports) = loader.load_export_section() {
//!     for export in exports.entries() {
//!         println!("{:5} {:?}", export.ordinal, export.name);
//!     }
//! }
//! # Ok::<(), pescope::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Two tiers of failure are kept apart:
//!
//! - Requests that can never succeed, like an unknown section name or a section number outside
//!   the table, return an [`Error`].
//! - Anomalies of the file (missing directories, dangling RVAs, truncated data, broken tables)
//!   produce `None` or a shortened read. Details are emitted as `debug` records through the
//!   [`log`](https://docs.rs/log) facade; the library installs no logger.
//!
//! ## Architecture
//!
//! - [`file`] - The immutable byte space of a sample (memory-mapped or in-memory)
//! - [`headers`] - Section table, optional header and data directory model
//! - [`PeData`] - A loaded sample: file plus decoded headers
//! - [`sections`] - The [`SectionLoader`] and the special-section parsers

#[macro_use]
pub(crate) mod error;

/// Byte-level access to the sample.
///
/// # Key Types
///
/// - [`file::File`] - The immutable byte space of a sample
/// - [`file::Backend`] - Storage abstraction implemented by [`file::Memory`] and [`file::Physical`]
/// - [`file::parser::Parser`] - Bounds-checked cursor used by the table parsers
pub mod file;

/// Section table, optional header and data directory model.
///
/// Header values are decoded by `goblin` and kept here as immutable plain data.
///
/// # Examples
///
/// ```rust
/// use pescope::headers::{DataDirectoryKey, OptionalHeader, SectionHeaderEntry, SectionTable};
///
/// let table = SectionTable::new(vec![
///     SectionHeaderEntry::new(".text", 1, 0x1000, 0x800, 0x400, 0x800, 0x6000_0020),
/// ]);
/// assert_eq!(table.find_by_rva(0x1234).unwrap().name, ".text");
///
/// let optional = OptionalHeader::default().with_directory(DataDirectoryKey::ImportTable, 0x1200, 0x28);
/// assert!(optional.data_directory(DataDirectoryKey::ExportTable).is_none());
/// ```
pub mod headers;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use pescope::prelude::*;
///
/// let pe = PeData::from_file("sample.dll".as_ref())?;
/// let imports = pe.loader().load_import_section();
/// # Ok::<(), pescope::Error>(())
/// ```
pub mod prelude;

/// Section loading, address resolution and special-section parsing.
pub mod sections;

mod pedata;

/// `pescope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::{PeData, Result};
///
/// fn load(path: &str) -> Result<PeData> {
///     PeData::from_file(std::path::Path::new(path))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `pescope` Error type
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::{Error, PeData};
///
/// match PeData::from_file(std::path::Path::new("sample.exe")) {
///     Ok(pe) => println!("{} sections", pe.section_table().len()),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// A loaded sample and its COFF header summary.
pub use pedata::{CoffSummary, PeData};

/// The section resolution engine.
///
/// See [`sections::SectionLoader`].
pub use sections::SectionLoader;

/// Low-level file access and parsing.
///
/// # Example
///
/// ```rust
/// use pescope::Parser;
/// let data = [0x4D, 0x5A, 0x90, 0x00];
/// let mut parser = Parser::new(&data);
/// assert_eq!(parser.read_le::<u16>()?, 0x5A4D);
/// # Ok::<(), pescope::Error>(())
/// ```
pub use file::{parser::Parser, File};
