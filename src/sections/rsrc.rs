//! Resource directory parser.
//!
//! Resources form a tree of directory tables. Conventionally the three levels are type, name
//! and language, but nothing in the format enforces that, and hostile samples build deeper
//! trees or trees that point back at themselves. All offsets inside the tree are relative to
//! the start of the resource directory, so the whole walk stays inside the window; only the
//! resource data itself is addressed by RVA.

use log::debug;
use strum::{EnumIter, IntoEnumIterator};

use crate::{
    headers::DataDirectoryKey,
    sections::{DirectoryWindow, LoaderConfig, RvaSource, SpecialSection},
    Parser, Result,
};

const HIGH_BIT: u32 = 0x8000_0000;

/// Well-known resource type ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
#[allow(missing_docs)]
pub enum ResourceType {
    Cursor = 1,
    Bitmap = 2,
    Icon = 3,
    Menu = 4,
    Dialog = 5,
    String = 6,
    FontDir = 7,
    Font = 8,
    Accelerator = 9,
    RcData = 10,
    MessageTable = 11,
    GroupCursor = 12,
    GroupIcon = 14,
    Version = 16,
    DlgInclude = 17,
    PlugPlay = 19,
    Vxd = 20,
    AniCursor = 21,
    AniIcon = 22,
    Html = 23,
    Manifest = 24,
}

impl ResourceType {
    /// The numeric id of this type.
    #[must_use]
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Maps a numeric id to a well-known type.
    #[must_use]
    pub fn from_id(id: u32) -> Option<ResourceType> {
        ResourceType::iter().find(|kind| kind.id() == id)
    }
}

/// The key of a resource directory entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceId {
    /// Numeric id
    Id(u32),
    /// Name string
    Name(String),
}

impl ResourceId {
    /// The well-known type this id stands for, when used at the type level of the tree.
    #[must_use]
    pub fn resource_type(&self) -> Option<ResourceType> {
        match self {
            ResourceId::Id(id) => ResourceType::from_id(*id),
            ResourceId::Name(_) => None,
        }
    }
}

/// A leaf of the resource tree, describing where the resource bytes are.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceDataEntry {
    /// RVA of the resource bytes
    pub data_rva: u32,
    /// Size of the resource bytes
    pub size: u32,
    /// Code page used to decode text in the resource
    pub code_page: u32,
    /// Reserved, should be zero
    pub reserved: u32,
}

impl ResourceDataEntry {
    /// Reads the resource bytes, clipped to the end of the file.
    #[must_use]
    pub fn data<'s>(&self, source: &'s dyn RvaSource) -> Option<&'s [u8]> {
        source.slice_at_rva(self.data_rva, usize::try_from(self.size).unwrap_or(usize::MAX))
    }
}

/// One directory table of the resource tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceDirectory {
    /// Resource flags, normally zero
    pub characteristics: u32,
    /// Time the resource data was created
    pub time_date_stamp: u32,
    /// Major version number
    pub major_version: u16,
    /// Minor version number
    pub minor_version: u16,
    /// Entries in table order
    pub entries: Vec<ResourceEntry>,
}

/// One entry of a directory table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Name or id of the entry
    pub id: ResourceId,
    /// What the entry points to
    pub node: ResourceNode,
}

/// The target of a directory entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceNode {
    /// Another directory table
    Directory(ResourceDirectory),
    /// A data entry
    Data(ResourceDataEntry),
}

/// A data entry together with the ids on the path from the root to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceLeaf<'a> {
    /// Ids from the root down, usually type, name and language
    pub path: Vec<&'a ResourceId>,
    /// The data entry
    pub data: &'a ResourceDataEntry,
}

impl ResourceLeaf<'_> {
    /// The well-known type of the leaf, taken from the first level of its path.
    #[must_use]
    pub fn resource_type(&self) -> Option<ResourceType> {
        self.path.first().and_then(|id| id.resource_type())
    }
}

/// The decoded resource tree of an image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceSection {
    root: ResourceDirectory,
}

impl ResourceSection {
    /// The root directory table.
    #[must_use]
    pub fn root(&self) -> &ResourceDirectory {
        &self.root
    }

    /// All data entries in depth-first order.
    #[must_use]
    pub fn leaves(&self) -> Vec<ResourceLeaf<'_>> {
        let mut leaves = Vec::new();
        let mut path = Vec::new();
        collect_leaves(&self.root, &mut path, &mut leaves);
        leaves
    }

    /// Data entries whose first path element is the given type.
    #[must_use]
    pub fn leaves_of_type(&self, kind: ResourceType) -> Vec<ResourceLeaf<'_>> {
        self.leaves()
            .into_iter()
            .filter(|leaf| leaf.resource_type() == Some(kind))
            .collect()
    }
}

fn collect_leaves<'a>(
    directory: &'a ResourceDirectory,
    path: &mut Vec<&'a ResourceId>,
    leaves: &mut Vec<ResourceLeaf<'a>>,
) {
    for entry in &directory.entries {
        path.push(&entry.id);
        match &entry.node {
            ResourceNode::Directory(child) => collect_leaves(child, path, leaves),
            ResourceNode::Data(data) => leaves.push(ResourceLeaf {
                path: path.clone(),
                data,
            }),
        }
        path.pop();
    }
}

impl SpecialSection for ResourceSection {
    const KEY: DataDirectoryKey = DataDirectoryKey::ResourceTable;

    fn parse(
        window: &DirectoryWindow<'_>,
        _source: &dyn RvaSource,
        config: &LoaderConfig,
    ) -> Result<Self> {
        let mut walker = TreeWalker {
            data: window.data,
            config,
            remaining_entries: config.max_resource_entries,
            path: Vec::new(),
        };

        Ok(ResourceSection {
            root: walker.directory(0, 0)?,
        })
    }
}

struct TreeWalker<'a, 'c> {
    data: &'a [u8],
    config: &'c LoaderConfig,
    remaining_entries: usize,
    /// Offsets of the directory tables on the current path
    path: Vec<usize>,
}

impl TreeWalker<'_, '_> {
    fn directory(&mut self, offset: usize, depth: usize) -> Result<ResourceDirectory> {
        if self.path.contains(&offset) {
            return Err(malformed_error!(
                "Resource directory at offset {:#x} is its own ancestor",
                offset
            ));
        }

        let mut parser = Parser::new(self.data);
        parser.seek(offset)?;

        let characteristics = parser.read_le::<u32>()?;
        let time_date_stamp = parser.read_le::<u32>()?;
        let major_version = parser.read_le::<u16>()?;
        let minor_version = parser.read_le::<u16>()?;
        let named = parser.read_le::<u16>()?;
        let ids = parser.read_le::<u16>()?;

        self.path.push(offset);
        let mut entries = Vec::new();
        for _ in 0..usize::from(named) + usize::from(ids) {
            if self.remaining_entries == 0 {
                debug!("Resource entry limit reached at directory offset {offset:#x}");
                break;
            }
            self.remaining_entries -= 1;

            let name_field = parser.read_le::<u32>()?;
            let data_field = parser.read_le::<u32>()?;

            let id = if name_field & HIGH_BIT != 0 {
                ResourceId::Name(self.name((name_field & !HIGH_BIT) as usize)?)
            } else {
                ResourceId::Id(name_field)
            };

            let node = if data_field & HIGH_BIT != 0 {
                if depth + 1 >= self.config.max_resource_depth {
                    debug!("Resource tree deeper than {}, subtree skipped", depth + 1);
                    continue;
                }
                ResourceNode::Directory(self.directory((data_field & !HIGH_BIT) as usize, depth + 1)?)
            } else {
                ResourceNode::Data(self.data_entry(data_field as usize)?)
            };

            entries.push(ResourceEntry { id, node });
        }
        self.path.pop();

        Ok(ResourceDirectory {
            characteristics,
            time_date_stamp,
            major_version,
            minor_version,
            entries,
        })
    }

    fn name(&self, offset: usize) -> Result<String> {
        let mut parser = Parser::new(self.data);
        parser.seek(offset)?;
        parser.read_prefixed_string_utf16()
    }

    fn data_entry(&self, offset: usize) -> Result<ResourceDataEntry> {
        let mut parser = Parser::new(self.data);
        parser.seek(offset)?;

        Ok(ResourceDataEntry {
            data_rva: parser.read_le::<u32>()?,
            size: parser.read_le::<u32>()?,
            code_page: parser.read_le::<u32>()?,
            reserved: parser.read_le::<u32>()?,
        })
    }
}
