use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into two tiers. Requests that can never succeed, such as asking for a section
/// name or number that the section table does not contain, are reported through
/// [`Error::SectionNotFound`] and [`Error::SectionIndexOutOfRange`]. Anomalies that originate
/// from the file itself (missing directories, oversized declarations, broken import tables)
/// never reach the caller as an `Error` from the section loader; they are reported as `None`.
/// The remaining variants are produced while decoding headers or while a table parser walks a
/// directory window.
///
/// # Error Categories
///
/// ## File Parsing Errors
/// - [`Error::Malformed`] - Corrupted or invalid file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the available bytes
/// - [`Error::Empty`] - Empty input provided
///
/// ## Lookup Errors
/// - [`Error::SectionNotFound`] - No section with the requested name
/// - [`Error::SectionIndexOutOfRange`] - Section number outside `1..=count`
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::GoblinErr`] - Header decoding errors from the goblin crate
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::{Error, PeData};
/// use std::path::Path;
///
/// let pe = PeData::from_file(Path::new("sample.exe"))?;
/// match pe.loader().load_section(".rsrc") {
///     Ok(section) => println!("{} bytes", section.len()),
///     Err(Error::SectionNotFound(name)) => println!("no section named {name}"),
///     Err(e) => println!("Other error: {e}"),
/// }
/// # Ok::<(), pescope::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // File parsing Errors
    /// The file is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    ///
    /// This is the safety net behind every bounds-checked read: a table parser that follows
    /// a pointer past the end of its window ends up here instead of reading foreign bytes.
    #[error("Out of Bound read would have occurred - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// No section in the section table carries the requested name.
    ///
    /// Section names are compared exactly, after stripping trailing NUL padding.
    #[error("No section named '{0}'")]
    SectionNotFound(String),

    /// The requested section number is outside of `1..=count`.
    ///
    /// Section numbers are 1-based, matching the position of the header in the table.
    #[error("Section number {index} is out of range, table holds {count} sections")]
    SectionIndexOutOfRange {
        /// The number that was requested
        index: usize,
        /// The number of sections in the table
        count: usize,
    },

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// Error from the goblin crate during header decoding.
    ///
    /// goblin decodes the DOS, COFF and optional headers as well as the raw
    /// section headers; this error wraps any failure from that layer.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),
}
