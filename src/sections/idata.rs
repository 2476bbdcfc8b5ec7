//! Import directory parser.
//!
//! The import directory is an array of 20-byte descriptors terminated by an all-zero
//! descriptor. Each descriptor names a DLL and points at a lookup table of thunks, 4 bytes wide
//! in PE32 images and 8 bytes wide in PE32+ images. A thunk with the high bit set imports by
//! ordinal; any other non-zero thunk is the RVA of a hint/name entry.
//!
//! DLL names and lookup tables usually live outside the directory itself, so they are read
//! through the [`RvaSource`] rather than the window.

use log::debug;

use crate::{
    file::io::read_le_at,
    headers::DataDirectoryKey,
    sections::{DirectoryWindow, LoaderConfig, RvaSource, SpecialSection},
    Parser, Result,
};

const IMPORT_DESCRIPTOR_SIZE: usize = 20;
const ORDINAL_FLAG_32: u64 = 0x8000_0000;
const ORDINAL_FLAG_64: u64 = 0x8000_0000_0000_0000;

/// One imported symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportEntry {
    /// Import by ordinal
    Ordinal(u16),
    /// Import by name, with the loader hint into the exporting DLL's name table
    Name {
        /// Index into the export name pointer table to try first
        hint: u16,
        /// Symbol name
        name: String,
    },
    /// Import by name whose hint/name entry does not resolve, kept to preserve thunk positions
    Unresolved(u32),
}

/// The imports of one DLL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedDll {
    /// DLL name as stored in the file
    pub name: String,
    /// RVA of the import lookup table, zero if absent
    pub original_first_thunk: u32,
    /// RVA of the import address table
    pub first_thunk: u32,
    /// Zero unless the imports are bound
    pub time_date_stamp: u32,
    /// Index of the first forwarder reference
    pub forwarder_chain: u32,
    /// Imported symbols in lookup table order, one per thunk; empty if the lookup table does
    /// not resolve or the directory's entry budget is spent
    pub entries: Vec<ImportEntry>,
}

/// The decoded import directory of an image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportSection {
    dlls: Vec<ImportedDll>,
}

impl ImportSection {
    /// Imported DLLs in descriptor order.
    #[must_use]
    pub fn dlls(&self) -> &[ImportedDll] {
        &self.dlls
    }

    /// Finds a DLL by name, ignoring ASCII case.
    #[must_use]
    pub fn dll(&self, name: &str) -> Option<&ImportedDll> {
        self.dlls
            .iter()
            .find(|dll| dll.name.eq_ignore_ascii_case(name))
    }

    /// Returns `true` if no DLL is imported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dlls.is_empty()
    }
}

impl SpecialSection for ImportSection {
    const KEY: DataDirectoryKey = DataDirectoryKey::ImportTable;

    fn parse(
        window: &DirectoryWindow<'_>,
        source: &dyn RvaSource,
        config: &LoaderConfig,
    ) -> Result<Self> {
        if window.data.len() < IMPORT_DESCRIPTOR_SIZE {
            return Err(malformed_error!(
                "Import directory of {} bytes holds no descriptor",
                window.data.len()
            ));
        }

        let mut parser = window.parser();
        let mut dlls = Vec::new();
        let mut budget = config.max_import_entries;

        while parser.remaining() >= IMPORT_DESCRIPTOR_SIZE
            && dlls.len() < config.max_import_descriptors
        {
            let original_first_thunk = parser.read_le::<u32>()?;
            let time_date_stamp = parser.read_le::<u32>()?;
            let forwarder_chain = parser.read_le::<u32>()?;
            let name_rva = parser.read_le::<u32>()?;
            let first_thunk = parser.read_le::<u32>()?;

            if original_first_thunk == 0
                && time_date_stamp == 0
                && forwarder_chain == 0
                && name_rva == 0
                && first_thunk == 0
            {
                break;
            }

            let name = source.read_cstring_at(name_rva, config.max_string_len)?;

            let lookup = if original_first_thunk != 0 {
                original_first_thunk
            } else {
                first_thunk
            };
            let entries = if budget == 0 {
                debug!("Import entry budget spent, skipping lookup table of {name}");
                Vec::new()
            } else {
                read_thunks(source, lookup, budget, config).unwrap_or_else(|| {
                    debug!("Import lookup table of {name} at RVA {lookup:#x} does not resolve");
                    Vec::new()
                })
            };
            budget = budget.saturating_sub(entries.len());

            dlls.push(ImportedDll {
                name,
                original_first_thunk,
                first_thunk,
                time_date_stamp,
                forwarder_chain,
                entries,
            });
        }

        Ok(ImportSection { dlls })
    }
}

/// Walks a lookup table until the terminating zero thunk, the end of the file or `limit`
/// thunks, whichever comes first. `limit` is capped by the per-DLL limit.
fn read_thunks(
    source: &dyn RvaSource,
    rva: u32,
    limit: usize,
    config: &LoaderConfig,
) -> Option<Vec<ImportEntry>> {
    let limit = limit.min(config.max_thunks_per_import);
    let pe32_plus = source.is_pe32_plus();
    let width = if pe32_plus { 8 } else { 4 };
    let data = source.slice_at_rva(rva, limit.saturating_mul(width))?;

    let mut entries = Vec::new();
    let mut offset = 0;
    while entries.len() < limit {
        let thunk = if pe32_plus {
            read_le_at::<u64>(data, &mut offset)
        } else {
            read_le_at::<u32>(data, &mut offset).map(u64::from)
        };
        let Ok(thunk) = thunk else {
            break;
        };
        if thunk == 0 {
            break;
        }

        let ordinal_flag = if pe32_plus {
            ORDINAL_FLAG_64
        } else {
            ORDINAL_FLAG_32
        };
        if thunk & ordinal_flag != 0 {
            entries.push(ImportEntry::Ordinal((thunk & 0xFFFF) as u16));
            continue;
        }

        let hint_name_rva = (thunk & 0x7FFF_FFFF) as u32;
        match read_hint_name(source, hint_name_rva, config) {
            Some(entry) => entries.push(entry),
            None => {
                debug!("Import hint/name entry at RVA {hint_name_rva:#x} does not resolve");
                entries.push(ImportEntry::Unresolved(hint_name_rva));
            }
        }
    }

    Some(entries)
}

fn read_hint_name(source: &dyn RvaSource, rva: u32, config: &LoaderConfig) -> Option<ImportEntry> {
    let data = source.slice_at_rva(rva, config.max_string_len.saturating_add(2))?;
    let mut parser = Parser::new(data);

    let hint = parser.read_le::<u16>().ok()?;
    let name = parser.read_cstring(config.max_string_len).ok()?;

    Some(ImportEntry::Name { hint, name })
}
