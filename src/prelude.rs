//! # pescope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the pescope library. Import this module to get quick access to the essential
//! types for section and data directory analysis.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all pescope operations
pub use crate::Error;

/// The result type used throughout pescope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// A loaded sample: file bytes plus decoded headers
pub use crate::{CoffSummary, PeData};

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Header Model
// ================================================================================================

/// Section table and its entries
pub use crate::headers::{SectionCharacteristics, SectionHeaderEntry, SectionTable};

/// Optional header and data directories
pub use crate::headers::{DataDirectoryEntry, DataDirectoryKey, DllCharacteristic, OptionalHeader};

// ================================================================================================
// Section Loading
// ================================================================================================

/// Address resolution and section loading
pub use crate::sections::{DirectoryWindow, LoaderConfig, PeSection, SectionLoader};

/// Extension points for custom directory parsers
pub use crate::sections::{RvaSource, SpecialSection};

/// Export directory
pub use crate::sections::{ExportEntry, ExportSection};

/// Import directory
pub use crate::sections::{ImportEntry, ImportSection, ImportedDll};

/// Resource directory
pub use crate::sections::{
    ResourceDataEntry, ResourceId, ResourceLeaf, ResourceNode, ResourceSection, ResourceType,
};
