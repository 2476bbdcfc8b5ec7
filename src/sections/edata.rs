//! Export directory parser.

use log::debug;

use crate::{
    file::io::read_le_at,
    headers::DataDirectoryKey,
    sections::{DirectoryWindow, LoaderConfig, RvaSource, SpecialSection},
    Parser, Result,
};

const EXPORT_DIRECTORY_SIZE: usize = 40;

/// One used slot of the export address table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportEntry {
    /// Ordinal base plus the index into the address table
    pub ordinal: u32,
    /// RVA of the exported symbol, or of the forwarder string
    pub rva: u32,
    /// First name the name pointer table assigns to this slot
    pub name: Option<String>,
    /// `DLL.Symbol` target if the export is forwarded to another module
    pub forwarder: Option<String>,
}

/// The decoded export directory of an image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSection {
    /// Reserved flags, normally zero
    pub characteristics: u32,
    /// Time the export data was created
    pub time_date_stamp: u32,
    /// Major version number
    pub major_version: u16,
    /// Minor version number
    pub minor_version: u16,
    /// Name of the DLL, if its RVA resolves
    pub name: Option<String>,
    /// Ordinal of the first address table entry
    pub ordinal_base: u32,
    /// Number of address table entries the directory declares
    pub number_of_functions: u32,
    /// Number of name pointers the directory declares
    pub number_of_names: u32,
    entries: Vec<ExportEntry>,
}

impl ExportSection {
    /// Used address table slots in table order.
    #[must_use]
    pub fn entries(&self) -> &[ExportEntry] {
        &self.entries
    }

    /// Finds an export by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&ExportEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.as_deref() == Some(name))
    }

    /// Finds an export by ordinal.
    #[must_use]
    pub fn by_ordinal(&self, ordinal: u32) -> Option<&ExportEntry> {
        self.entries.iter().find(|entry| entry.ordinal == ordinal)
    }

    /// Exports forwarded to other modules.
    pub fn forwarders(&self) -> impl Iterator<Item = &ExportEntry> {
        self.entries.iter().filter(|entry| entry.forwarder.is_some())
    }
}

impl SpecialSection for ExportSection {
    const KEY: DataDirectoryKey = DataDirectoryKey::ExportTable;

    fn parse(
        window: &DirectoryWindow<'_>,
        source: &dyn RvaSource,
        config: &LoaderConfig,
    ) -> Result<Self> {
        if window.data.len() < EXPORT_DIRECTORY_SIZE {
            return Err(malformed_error!(
                "Export directory holds {} bytes, expected at least {}",
                window.data.len(),
                EXPORT_DIRECTORY_SIZE
            ));
        }

        let mut parser = window.parser();
        let characteristics = parser.read_le::<u32>()?;
        let time_date_stamp = parser.read_le::<u32>()?;
        let major_version = parser.read_le::<u16>()?;
        let minor_version = parser.read_le::<u16>()?;
        let name_rva = parser.read_le::<u32>()?;
        let ordinal_base = parser.read_le::<u32>()?;
        let number_of_functions = parser.read_le::<u32>()?;
        let number_of_names = parser.read_le::<u32>()?;
        let address_of_functions = parser.read_le::<u32>()?;
        let address_of_names = parser.read_le::<u32>()?;
        let address_of_name_ordinals = parser.read_le::<u32>()?;

        let name = match source.read_cstring_at(name_rva, config.max_string_len) {
            Ok(name) => Some(name),
            Err(error) => {
                debug!("Export DLL name unavailable: {error}");
                None
            }
        };

        let function_count = usize::try_from(number_of_functions)
            .unwrap_or(usize::MAX)
            .min(config.max_exports);
        let addresses = read_table::<u32>(source, address_of_functions, function_count)
            .ok_or_else(|| {
                malformed_error!(
                    "Export address table at RVA {:#x} does not resolve",
                    address_of_functions
                )
            })?;

        let mut names: Vec<Option<String>> = vec![None; addresses.len()];
        let name_count = usize::try_from(number_of_names)
            .unwrap_or(usize::MAX)
            .min(config.max_exports);
        if name_count > 0 {
            let pointers = read_table::<u32>(source, address_of_names, name_count);
            let ordinals = read_table::<u16>(source, address_of_name_ordinals, name_count);

            match (pointers, ordinals) {
                (Some(pointers), Some(ordinals)) => {
                    for (pointer, index) in pointers.into_iter().zip(ordinals) {
                        let Some(slot) = names.get_mut(usize::from(index)) else {
                            continue;
                        };
                        if slot.is_some() {
                            continue;
                        }
                        if let Ok(name) = source.read_cstring_at(pointer, config.max_string_len) {
                            *slot = Some(name);
                        }
                    }
                }
                _ => debug!(
                    "Export name tables at RVA {:#x} / {:#x} do not resolve",
                    address_of_names, address_of_name_ordinals
                ),
            }
        }

        let mut entries = Vec::new();
        for (index, (rva, name)) in addresses.into_iter().zip(names).enumerate() {
            if rva == 0 {
                continue;
            }

            let forwarder = window.offset_of(rva).and_then(|offset| {
                let mut parser = Parser::new(&window.data[offset..]);
                parser.read_cstring(config.max_string_len).ok()
            });

            entries.push(ExportEntry {
                ordinal: ordinal_base.wrapping_add(u32::try_from(index).unwrap_or(u32::MAX)),
                rva,
                name,
                forwarder,
            });
        }

        Ok(ExportSection {
            characteristics,
            time_date_stamp,
            major_version,
            minor_version,
            name,
            ordinal_base,
            number_of_functions,
            number_of_names,
            entries,
        })
    }
}

/// Reads up to `count` little-endian values at `rva`, fewer if the file ends first.
fn read_table<T: crate::file::io::PeIO>(
    source: &dyn RvaSource,
    rva: u32,
    count: usize,
) -> Option<Vec<T>> {
    if count == 0 {
        return Some(Vec::new());
    }

    let len = count.saturating_mul(std::mem::size_of::<T>());
    let data = source.slice_at_rva(rva, len)?;

    let mut values = Vec::with_capacity(data.len() / std::mem::size_of::<T>());
    let mut offset = 0;
    while let Ok(value) = read_le_at::<T>(data, &mut offset) {
        values.push(value);
    }

    Some(values)
}
