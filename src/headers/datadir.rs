//! Data directory keys and entries.
//!
//! The optional header ends with an array of up to 16 `(RVA, size)` pairs. Their meaning is fixed
//! by position; [`DATA_DIRECTORY_KEYS`] is the process-wide table mapping a position to its
//! [`DataDirectoryKey`] and back.

use strum::{EnumCount, EnumIter};

/// The kind of table a data directory entry points to, in optional header order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, EnumIter, EnumCount)]
pub enum DataDirectoryKey {
    /// Export directory (`.edata`)
    ExportTable,
    /// Import directory (`.idata`)
    ImportTable,
    /// Resource directory (`.rsrc`)
    ResourceTable,
    /// Exception directory (`.pdata`)
    ExceptionTable,
    /// Attribute certificate table; its address is a file offset, not an RVA
    CertificateTable,
    /// Base relocation table (`.reloc`)
    BaseRelocationTable,
    /// Debug directory
    Debug,
    /// Reserved, must be zero
    Architecture,
    /// RVA of the value stored in the global pointer register
    GlobalPtr,
    /// Thread local storage table (`.tls`)
    TlsTable,
    /// Load configuration table
    LoadConfigTable,
    /// Bound import table
    BoundImport,
    /// Import address table
    Iat,
    /// Delay import descriptor
    DelayImportDescriptor,
    /// CLR runtime header of managed images
    ClrRuntimeHeader,
    /// Reserved, must be zero
    Reserved,
}

/// Position in the directory array → key.
pub const DATA_DIRECTORY_KEYS: [DataDirectoryKey; DataDirectoryKey::COUNT] = [
    DataDirectoryKey::ExportTable,
    DataDirectoryKey::ImportTable,
    DataDirectoryKey::ResourceTable,
    DataDirectoryKey::ExceptionTable,
    DataDirectoryKey::CertificateTable,
    DataDirectoryKey::BaseRelocationTable,
    DataDirectoryKey::Debug,
    DataDirectoryKey::Architecture,
    DataDirectoryKey::GlobalPtr,
    DataDirectoryKey::TlsTable,
    DataDirectoryKey::LoadConfigTable,
    DataDirectoryKey::BoundImport,
    DataDirectoryKey::Iat,
    DataDirectoryKey::DelayImportDescriptor,
    DataDirectoryKey::ClrRuntimeHeader,
    DataDirectoryKey::Reserved,
];

impl DataDirectoryKey {
    /// Returns the key stored at `index` of the directory array.
    #[must_use]
    pub fn from_index(index: usize) -> Option<DataDirectoryKey> {
        DATA_DIRECTORY_KEYS.get(index).copied()
    }

    /// Position of this key in the directory array.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One present entry of the data directory array.
///
/// Directories the header does not declare have no entry at all; see
/// [`crate::headers::OptionalHeader::data_directory`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DataDirectoryEntry {
    /// Which table this entry describes
    pub key: DataDirectoryKey,
    /// RVA of the table (a file offset for [`DataDirectoryKey::CertificateTable`])
    pub virtual_address: u32,
    /// Declared size of the table in bytes
    pub size: u32,
}

impl DataDirectoryEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(key: DataDirectoryKey, virtual_address: u32, size: u32) -> Self {
        DataDirectoryEntry {
            key,
            virtual_address,
            size,
        }
    }
}
