//! Header model consumed by the section loader.
//!
//! The byte-level decoding of the DOS, COFF and optional headers is done by `goblin`. This
//! module holds the immutable values the loader works with once decoding is complete: the
//! section table, the optional header fields and data directory map, and the flag words.
//!
//! # Key Components
//!
//! - [`crate::headers::SectionTable`] / [`crate::headers::SectionHeaderEntry`] - section table in on-disk order
//! - [`crate::headers::OptionalHeader`] - consumed optional header fields and the data directory map
//! - [`crate::headers::DataDirectoryKey`] / [`crate::headers::DataDirectoryEntry`] - data directory model
//! - [`crate::headers::SectionCharacteristics`] / [`crate::headers::DllCharacteristic`] - flag words
//!
//! All values are plain data, cheap to clone, and never reference the file they were read from.

mod characteristics;
mod datadir;
mod optional;
mod section;

pub use characteristics::{DllCharacteristic, SectionCharacteristics, DLL_CHARACTERISTIC_BITS};
pub use datadir::{DataDirectoryEntry, DataDirectoryKey, DATA_DIRECTORY_KEYS};
pub use optional::{OptionalHeader, PE32_MAGIC, PE32_PLUS_MAGIC};
pub use section::{SectionHeaderEntry, SectionTable};
