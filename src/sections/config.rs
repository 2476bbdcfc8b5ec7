//! Limits for walking special sections of untrusted files
//!
//! Every table the special-section parsers walk is sized by fields the file controls. These
//! limits cap how much work a single directory can cause, independent of how large its
//! declarations claim to be.

/// Limits applied by the special-section parsers
///
/// Exceeding a count limit stops the walk and keeps what was read so far. Exceeding
/// `max_resource_depth` discards the subtree below the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Maximum number of import descriptors read from one import directory (default: 4096)
    pub max_import_descriptors: usize,

    /// Maximum number of thunks read per imported DLL (default: 65536)
    pub max_thunks_per_import: usize,

    /// Maximum number of thunks read from one import directory in total (default: 262144)
    /// Descriptors may share a lookup table, so the per-DLL limit alone does not bound the work
    pub max_import_entries: usize,

    /// Maximum number of export address table entries (default: 65536)
    pub max_exports: usize,

    /// Maximum nesting depth of the resource directory tree (default: 16)
    /// The usual type / name / language tree has depth 3
    pub max_resource_depth: usize,

    /// Maximum number of resource directory entries visited in total (default: 65536)
    pub max_resource_entries: usize,

    /// Maximum number of bytes read for a NUL-terminated string (default: 1024)
    pub max_string_len: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_import_descriptors: 4096,
            max_thunks_per_import: 65536,
            max_import_entries: 262_144,
            max_exports: 65536,
            max_resource_depth: 16,
            max_resource_entries: 65536,
            max_string_len: 1024,
        }
    }
}

impl LoaderConfig {
    /// Creates a configuration with tight limits for bulk triage of untrusted samples
    ///
    /// Large but legitimate tables are cut short.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            max_import_descriptors: 256,
            max_thunks_per_import: 4096,
            max_import_entries: 16384,
            max_exports: 4096,
            max_resource_depth: 4,
            max_resource_entries: 4096,
            max_string_len: 256,
        }
    }

    /// Creates a configuration without count limits
    ///
    /// **Warning**: a crafted file can make the parsers iterate over every byte of a large
    /// directory window. Use only for trusted input.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_import_descriptors: usize::MAX,
            max_thunks_per_import: usize::MAX,
            max_import_entries: usize::MAX,
            max_exports: usize::MAX,
            max_resource_depth: usize::MAX,
            max_resource_entries: usize::MAX,
            max_string_len: usize::MAX,
        }
    }
}
