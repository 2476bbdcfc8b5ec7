//! Cursor-based byte parser for PE directory tables.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a bounds-checked cursor over a
//! byte slice. The export, import and resource parsers use it to walk the directory window the
//! [`crate::sections::SectionLoader`] hands them, so that a lying count or offset inside a table
//! surfaces as [`crate::Error::OutOfBounds`] rather than a panic.
//!
//! # Key Components
//!
//! ## Navigation Methods
//! - [`crate::file::parser::Parser::seek`] - Move to specific position
//! - [`crate::file::parser::Parser::advance_by`] - Move forward by specified bytes
//! - [`crate::file::parser::Parser::pos`] - Get current position
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_le`] - Read primitive types (little-endian)
//! - [`crate::file::parser::Parser::read_bytes`] - Read a raw byte slice
//! - [`crate::file::parser::Parser::read_cstring`] - Read a NUL-terminated, length-capped string
//! - [`crate::file::parser::Parser::read_prefixed_string_utf16`] - Read a resource name string
//!
//! # Examples
//!
//! ```rust
//! use pescope::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
//! let mut parser = Parser::new(&data);
//!
//! let first = parser.read_le::<u32>()?;
//! assert_eq!(first, 0x04030201);
//!
//! parser.seek(6)?;
//! let last_bytes = parser.read_le::<u16>()?;
//! assert_eq!(last_bytes, 0x0807);
//! # Ok::<(), pescope::Error>(())
//! ```

use widestring::U16String;

use crate::{
    file::io::{read_le_at, PeIO},
    Result,
};

/// A generic binary data parser for reading PE directory structures.
///
/// `Parser` maintains a position cursor into a borrowed slice. Every read validates data
/// availability first and leaves the cursor untouched on failure.
///
/// # Examples
///
/// ```rust
/// use pescope::Parser;
///
/// let data = [0x34, 0x12, b'a', b'b', 0x00];
/// let mut parser = Parser::new(&data);
///
/// assert_eq!(parser.read_le::<u16>()?, 0x1234);
/// assert_eq!(parser.read_cstring(16)?, "ab");
/// assert!(!parser.has_more_data());
/// # Ok::<(), pescope::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying data buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the position to a specific offset.
    ///
    /// Seeking to exactly the end of the buffer is allowed; any read from there fails.
    ///
    /// # Arguments
    /// * `pos` - The position to move the cursor to
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Arguments
    /// * `step` - Amount of bytes to advance
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        self.position = self.calc_end_position(step)?;
        Ok(())
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Read a type `T` from the current position in little-endian format and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_le<T: PeIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Returns the number of bytes remaining from the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Calculates an end position safely with overflow checking.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the calculation would overflow
    /// or if the resulting position exceeds the data length.
    pub fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(out_of_bounds_error!())?;

        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(end)
    }

    /// Reads a slice of bytes of the specified length from the current position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `length` bytes would exceed the data.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Read a NUL-terminated string of at most `max_len` bytes.
    ///
    /// A string that runs into the end of the buffer or into `max_len` without a terminator is
    /// accepted as-is; section names and DLL names in hostile files are frequently unterminated.
    /// Invalid UTF-8 is replaced rather than rejected.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the cursor is already at the end of the data.
    pub fn read_cstring(&mut self, max_len: usize) -> Result<String> {
        if !self.has_more_data() {
            return Err(out_of_bounds_error!());
        }

        let start = self.position;
        let limit = start.saturating_add(max_len).min(self.data.len());
        let end = self.data[start..limit]
            .iter()
            .position(|byte| *byte == 0)
            .map_or(limit, |nul| start + nul);

        self.position = if end < self.data.len() && self.data[end] == 0 {
            end + 1
        } else {
            end
        };

        Ok(String::from_utf8_lossy(&self.data[start..end]).into_owned())
    }

    /// Read a resource directory string: a `u16` character count followed by that many
    /// UTF-16LE code units.
    ///
    /// Unpaired surrogates are replaced rather than rejected.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the prefix or the characters exceed the data.
    pub fn read_prefixed_string_utf16(&mut self) -> Result<String> {
        let start = self.position;
        let length = usize::from(self.read_le::<u16>()?);

        let Some(byte_len) = length.checked_mul(2) else {
            self.position = start;
            return Err(out_of_bounds_error!());
        };
        if self.remaining() < byte_len {
            self.position = start;
            return Err(out_of_bounds_error!());
        }

        let mut units: Vec<u16> = Vec::with_capacity(length);
        for _ in 0..length {
            units.push(self.read_le::<u16>()?);
        }

        Ok(U16String::from_vec(units).to_string_lossy())
    }
}
