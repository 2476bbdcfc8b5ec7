//! Synthetic PE images for integration tests and benchmarks.
//!
//! [`PeBuilder`] lays out a DOS header, a PE32 or PE32+ optional header, the section table and
//! the raw section data. Section data and directory tables are placed by RVA, translated through
//! the declared sections, so malformed layouts can be built as easily as well-formed ones.

#![allow(dead_code)]

pub const PE_POINTER: usize = 0x80;
pub const HEADERS_SIZE: usize = 0x400;

pub const IMAGE_SCN_CNT_CODE: u32 = 0x0000_0020;
pub const IMAGE_SCN_CNT_INITIALIZED_DATA: u32 = 0x0000_0040;
pub const IMAGE_SCN_MEM_EXECUTE: u32 = 0x2000_0000;
pub const IMAGE_SCN_MEM_READ: u32 = 0x4000_0000;
pub const IMAGE_SCN_MEM_WRITE: u32 = 0x8000_0000;

pub const TEXT: u32 = IMAGE_SCN_CNT_CODE | IMAGE_SCN_MEM_EXECUTE | IMAGE_SCN_MEM_READ;
pub const RDATA: u32 = IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ;
pub const DATA: u32 = IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ | IMAGE_SCN_MEM_WRITE;

pub const EXPORT_TABLE: usize = 0;
pub const IMPORT_TABLE: usize = 1;
pub const RESOURCE_TABLE: usize = 2;
pub const BASE_RELOCATION_TABLE: usize = 5;
pub const IAT: usize = 12;

#[derive(Clone, Debug)]
pub struct SectionSpec {
    pub name: String,
    pub virtual_address: u32,
    pub virtual_size: u32,
    pub pointer_to_raw_data: u32,
    pub size_of_raw_data: u32,
    pub characteristics: u32,
}

#[derive(Clone, Debug)]
pub struct PeBuilder {
    pe32_plus: bool,
    entry_point: u32,
    image_base: u64,
    dll_characteristics: u16,
    time_date_stamp: u32,
    sections: Vec<SectionSpec>,
    directories: [(u32, u32); 16],
    patches: Vec<(usize, Vec<u8>)>,
    file_size: Option<usize>,
    optional_header: bool,
}

impl PeBuilder {
    pub fn pe32() -> Self {
        PeBuilder {
            pe32_plus: false,
            entry_point: 0,
            image_base: 0x0040_0000,
            dll_characteristics: 0x0140,
            time_date_stamp: 0x5E00_0000,
            sections: Vec::new(),
            directories: [(0, 0); 16],
            patches: Vec::new(),
            file_size: None,
            optional_header: true,
        }
    }

    pub fn pe32_plus() -> Self {
        PeBuilder {
            pe32_plus: true,
            image_base: 0x1_4000_0000,
            dll_characteristics: 0x8160,
            ..Self::pe32()
        }
    }

    pub fn is_pe32_plus(&self) -> bool {
        self.pe32_plus
    }

    pub fn entry_point(mut self, rva: u32) -> Self {
        self.entry_point = rva;
        self
    }

    pub fn without_optional_header(mut self) -> Self {
        self.optional_header = false;
        self
    }

    pub fn section(
        mut self,
        name: &str,
        virtual_address: u32,
        virtual_size: u32,
        pointer_to_raw_data: u32,
        size_of_raw_data: u32,
        characteristics: u32,
    ) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_string(),
            virtual_address,
            virtual_size,
            pointer_to_raw_data,
            size_of_raw_data,
            characteristics,
        });
        self
    }

    pub fn directory(mut self, index: usize, rva: u32, size: u32) -> Self {
        self.directories[index] = (rva, size);
        self
    }

    /// Writes `bytes` at a raw file offset.
    pub fn at_offset(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.patches.push((offset, bytes.to_vec()));
        self
    }

    /// Writes `bytes` at an RVA, translated through the first section containing it.
    pub fn at_rva(self, rva: u32, bytes: &[u8]) -> Self {
        let offset = self
            .offset_of(rva)
            .unwrap_or_else(|| panic!("RVA {rva:#x} is not backed by a section"));
        self.at_offset(offset, bytes)
    }

    /// Cuts the built image to `len` bytes.
    pub fn truncate(mut self, len: usize) -> Self {
        self.file_size = Some(len);
        self
    }

    pub fn offset_of(&self, rva: u32) -> Option<usize> {
        self.sections.iter().find_map(|section| {
            let extent = section.virtual_size.max(section.size_of_raw_data);
            let delta = rva.checked_sub(section.virtual_address)?;
            (delta < extent).then(|| (section.pointer_to_raw_data + delta) as usize)
        })
    }

    pub fn build(&self) -> Vec<u8> {
        let raw_end = self
            .sections
            .iter()
            .map(|s| s.pointer_to_raw_data as usize + s.size_of_raw_data as usize)
            .max()
            .unwrap_or(0);
        let patch_end = self
            .patches
            .iter()
            .map(|(offset, bytes)| offset + bytes.len())
            .max()
            .unwrap_or(0);
        let mut image = vec![0u8; HEADERS_SIZE.max(raw_end).max(patch_end)];

        // DOS header
        image[0..2].copy_from_slice(b"MZ");
        put_u32(&mut image, 0x3C, PE_POINTER as u32);

        // PE signature + COFF header
        let mut at = PE_POINTER;
        image[at..at + 4].copy_from_slice(b"PE\0\0");
        at += 4;
        let optional_size: u16 = match (self.optional_header, self.pe32_plus) {
            (false, _) => 0,
            (true, false) => 0xE0,
            (true, true) => 0xF0,
        };
        put_u16(&mut image, at, if self.pe32_plus { 0x8664 } else { 0x014C });
        put_u16(&mut image, at + 2, self.sections.len() as u16);
        put_u32(&mut image, at + 4, self.time_date_stamp);
        put_u16(&mut image, at + 16, optional_size);
        put_u16(&mut image, at + 18, 0x2102);
        at += 20;

        if self.optional_header {
            at = self.write_optional_header(&mut image, at);
        }

        for section in &self.sections {
            let name = section.name.as_bytes();
            let len = name.len().min(8);
            image[at..at + len].copy_from_slice(&name[..len]);
            put_u32(&mut image, at + 8, section.virtual_size);
            put_u32(&mut image, at + 12, section.virtual_address);
            put_u32(&mut image, at + 16, section.size_of_raw_data);
            put_u32(&mut image, at + 20, section.pointer_to_raw_data);
            put_u32(&mut image, at + 36, section.characteristics);
            at += 40;
        }
        assert!(at <= HEADERS_SIZE, "section table overflows the headers");

        for (offset, bytes) in &self.patches {
            image[*offset..*offset + bytes.len()].copy_from_slice(bytes);
        }

        if let Some(len) = self.file_size {
            image.truncate(len);
        }

        image
    }

    fn write_optional_header(&self, image: &mut [u8], start: usize) -> usize {
        let mut at = start;
        let size_of_image = self
            .sections
            .iter()
            .map(|s| s.virtual_address + s.virtual_size.max(s.size_of_raw_data))
            .max()
            .unwrap_or(0x1000);

        put_u16(image, at, if self.pe32_plus { 0x20B } else { 0x10B });
        image[at + 2] = 14;
        put_u32(image, at + 16, self.entry_point);
        put_u32(image, at + 20, 0x1000);
        if self.pe32_plus {
            at += 24;
            put_u64(image, at, self.image_base);
            at += 8;
        } else {
            put_u32(image, at + 24, 0x2000);
            at += 28;
            put_u32(image, at, self.image_base as u32);
            at += 4;
        }

        put_u32(image, at, 0x1000); // SectionAlignment
        put_u32(image, at + 4, 0x200); // FileAlignment
        put_u16(image, at + 8, 6); // MajorOperatingSystemVersion
        put_u16(image, at + 16, 6); // MajorSubsystemVersion
        put_u32(image, at + 24, size_of_image);
        put_u32(image, at + 28, HEADERS_SIZE as u32);
        put_u16(image, at + 36, 3); // IMAGE_SUBSYSTEM_WINDOWS_CUI
        put_u16(image, at + 38, self.dll_characteristics);
        at += 40;

        // Stack and heap reserve / commit
        let width = if self.pe32_plus { 8 } else { 4 };
        at += 4 * width;

        at += 4; // LoaderFlags
        put_u32(image, at, 16);
        at += 4;

        for (rva, size) in self.directories {
            put_u32(image, at, rva);
            put_u32(image, at + 4, size);
            at += 8;
        }

        at
    }
}

pub fn put_u16(image: &mut [u8], at: usize, value: u16) {
    image[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u32(image: &mut [u8], at: usize, value: u32) {
    image[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u64(image: &mut [u8], at: usize, value: u64) {
    image[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

pub fn le32(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn le64(values: &[u64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn utf16_prefixed(value: &str) -> Vec<u8> {
    let units: Vec<u16> = value.encode_utf16().collect();
    let mut bytes = (units.len() as u16).to_le_bytes().to_vec();
    for unit in units {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

/// The section layout shared by the sample images.
///
/// ```text
/// .text   va 0x1000  vs 0x100  raw 0x200 @ 0x400
/// .rdata  va 0x2000  vs 0x300  raw 0x400 @ 0x600   exports 0x2000, imports 0x2100, IAT 0x2180
/// .rsrc   va 0x3000  vs 0x100  raw 0x200 @ 0xA00   resources 0x3000
/// .reloc  va 0x4000  vs 0x20   raw 0x200 @ 0xC00
/// ```
pub fn sample_layout(builder: PeBuilder) -> PeBuilder {
    builder
        .entry_point(0x1000)
        .section(".text", 0x1000, 0x100, 0x400, 0x200, TEXT)
        .section(".rdata", 0x2000, 0x300, 0x600, 0x400, RDATA)
        .section(".rsrc", 0x3000, 0x100, 0xA00, 0x200, RDATA)
        .section(".reloc", 0x4000, 0x20, 0xC00, 0x200, RDATA)
}

/// Export directory of `sample.dll` with the named exports `First` and `Second`.
pub fn with_exports(builder: PeBuilder) -> PeBuilder {
    let mut directory = Vec::new();
    directory.extend_from_slice(&le32(&[0, 0x5E00_0000]));
    directory.extend_from_slice(&[0, 0, 0, 0]);
    directory.extend_from_slice(&le32(&[0x2028, 1, 2, 2, 0x2040, 0x2048, 0x2050]));

    builder
        .directory(EXPORT_TABLE, 0x2000, 0x80)
        .at_rva(0x2000, &directory)
        .at_rva(0x2028, b"sample.dll\0")
        .at_rva(0x2040, &le32(&[0x1010, 0x1020]))
        .at_rva(0x2048, &le32(&[0x2058, 0x2060]))
        .at_rva(0x2050, &[0, 0, 1, 0])
        .at_rva(0x2058, b"First\0")
        .at_rva(0x2060, b"Second\0")
}

/// Import directory pulling `ExitProcess` and ordinal 5 from KERNEL32.dll.
pub fn with_imports(builder: PeBuilder) -> PeBuilder {
    let thunks = if builder.is_pe32_plus() {
        le64(&[0x2160, 0x8000_0000_0000_0005, 0])
    } else {
        le32(&[0x2160, 0x8000_0005, 0])
    };

    let mut hint_name = 0x10u16.to_le_bytes().to_vec();
    hint_name.extend_from_slice(b"ExitProcess\0");

    builder
        .directory(IMPORT_TABLE, 0x2100, 0x28)
        .directory(IAT, 0x2180, thunks.len() as u32)
        .at_rva(0x2100, &le32(&[0x2140, 0, 0, 0x2130, 0x2180]))
        .at_rva(0x2130, b"KERNEL32.dll\0")
        .at_rva(0x2140, &thunks)
        .at_rva(0x2160, &hint_name)
        .at_rva(0x2180, &thunks)
}

/// Resource tree holding a single version resource: 16 / 1 / 0x409.
pub fn with_resources(builder: PeBuilder) -> PeBuilder {
    const HIGH_BIT: u32 = 0x8000_0000;

    builder
        .directory(RESOURCE_TABLE, 0x3000, 0x60)
        .at_rva(0x3000, &le32(&[0, 0, 0, 0x0001_0000]))
        .at_rva(0x3010, &le32(&[16, HIGH_BIT | 0x18]))
        .at_rva(0x3018, &le32(&[0, 0, 0, 0x0001_0000]))
        .at_rva(0x3028, &le32(&[1, HIGH_BIT | 0x30]))
        .at_rva(0x3030, &le32(&[0, 0, 0, 0x0001_0000]))
        .at_rva(0x3040, &le32(&[0x409, 0x48]))
        .at_rva(0x3048, &le32(&[0x3080, 0x10, 0, 0]))
        .at_rva(0x3080, b"VS_VERSION_INFO\0")
}

/// Base relocation directory with one empty block.
pub fn with_relocations(builder: PeBuilder) -> PeBuilder {
    builder
        .directory(BASE_RELOCATION_TABLE, 0x4000, 0x08)
        .at_rva(0x4000, &le32(&[0x1000, 0x08]))
}

/// A well-formed PE32 DLL with exports, imports, resources and relocations.
pub fn sample_dll() -> PeBuilder {
    with_relocations(with_resources(with_imports(with_exports(sample_layout(
        PeBuilder::pe32(),
    )))))
}

/// The PE32+ counterpart of [`sample_dll`].
pub fn sample_dll64() -> PeBuilder {
    with_relocations(with_resources(with_imports(with_exports(sample_layout(
        PeBuilder::pe32_plus(),
    )))))
}
