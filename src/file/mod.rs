//! Byte-space abstraction over PE samples.
//!
//! This module owns the only storage the section loader ever reads from: an immutable, finite
//! byte sequence of known length. It abstracts over where those bytes live and provides the
//! clipped reads the resolution engine is built on.
//!
//! # Key Components
//!
//! ## Core Types
//! - [`crate::file::File`] - Immutable byte space of a loaded sample
//! - [`crate::file::Backend`] - Trait for different data sources (disk files, memory buffers)
//!
//! ## Parsing Infrastructure
//! - [`crate::file::parser::Parser`] - Cursor over a byte slice used by the table parsers
//! - [`crate::file::io`] - Little-endian primitive reads
//!
//! ## Backend Implementations
//! - [`crate::file::physical::Physical`] - Memory-mapped file backend for disk access
//! - [`crate::file::memory::Memory`] - In-memory buffer backend
//!
//! # Examples
//!
//! ```rust,no_run
//! use pescope::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("sample.exe"))?;
//! println!("Loaded {} bytes", file.len());
//!
//! // A declared range running past the end of the file is clipped, not rejected
//! let tail = file.read_clipped(file.len() as u64 - 4, 0x1000);
//! assert_eq!(tail.len(), 4);
//! # Ok::<(), pescope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! Backends hand out positioned slices and keep no cursor state, so a [`crate::file::File`]
//! can be shared across threads and read concurrently.

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::path::Path;

use crate::{Error::Empty, Result};
pub use memory::Memory;
pub use physical::Physical;

/// Backend trait for file data sources.
///
/// This trait abstracts over the source of PE data, allowing for both in-memory and on-disk
/// representations. All implementations must be thread-safe.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// Returns `data[offset..offset + len]`, or [`crate::Error::OutOfBounds`] if any part of the
/// range lies outside `data`.
fn bounded_slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let Some(end) = offset.checked_add(len) else {
        return Err(out_of_bounds_error!());
    };

    data.get(offset..end).ok_or_else(|| out_of_bounds_error!())
}

/// Represents the immutable byte space of a loaded PE sample.
///
/// `File` does not interpret the bytes; header decoding happens in [`crate::PeData`] and
/// address translation in [`crate::sections::SectionLoader`]. It offers two kinds of reads:
/// strict ones ([`File::data_slice`]) that fail when a range is out of bounds, and clipped ones
/// ([`File::read_clipped`]) that silently shorten the range to what the file actually holds.
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::File;
///
/// let data = std::fs::read("sample.exe")?;
/// let file = File::from_mem(data)?;
///
/// let dos_header = file.data_slice(0, 64)?;
/// assert_eq!(&dos_header[0..2], b"MZ");
/// # Ok::<(), pescope::Error>(())
/// ```
pub struct File {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
}

impl File {
    /// Loads a file from the given path by memory-mapping it.
    ///
    /// # Arguments
    ///
    /// * `file` - Path to the file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or mapped, or if it is empty.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Wraps a buffer that is already in memory.
    ///
    /// # Arguments
    ///
    /// * `data` - The bytes of the file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Empty`] if the buffer is empty.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    /// Internal loader for any backend.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Empty`] if the backend holds no data.
    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        Ok(File {
            data: Box::new(data),
        })
    }

    /// Returns the total size of the loaded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the file has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the file size as a `u64`, the width all offset arithmetic is done in.
    #[must_use]
    pub fn file_size(&self) -> u64 {
        u64::try_from(self.len()).unwrap_or(u64::MAX)
    }

    /// Returns the raw data of the loaded file.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Returns a slice of the file data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The offset to start the slice from.
    /// * `len` - The length of the slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// Returns the part of `[offset, offset + len)` that lies inside the file.
    ///
    /// The range is clipped to the end of the file; an offset at or past the end yields an
    /// empty slice. All arithmetic saturates, so header values chosen to overflow an addition
    /// cannot move the read window.
    #[must_use]
    pub fn read_clipped(&self, offset: u64, len: u64) -> &[u8] {
        let available = self.file_size().saturating_sub(offset);
        let len = len.min(available);
        if len == 0 {
            return &[];
        }

        // Both values are bounded by the file length at this point.
        let (Ok(start), Ok(len)) = (usize::try_from(offset), usize::try_from(len)) else {
            return &[];
        };

        self.data_slice(start, len).unwrap_or(&[])
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File").field("len", &self.len()).finish()
    }
}
