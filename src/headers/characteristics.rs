//! Flag words of the section table and the optional header.
//!
//! Section characteristics are modelled as a [`bitflags`] set. DLL characteristics are modelled
//! as a closed enumeration, [`DllCharacteristic`], with one variant per bit of the 16-bit word,
//! including the bits the format reserves. Decoding a flag word and encoding the result again
//! therefore always reproduces the original value, even for samples that set reserved bits.

use bitflags::bitflags;
use strum::{EnumCount, EnumIter};

bitflags! {
    /// `IMAGE_SCN_*` flags of a section header.
    ///
    /// Values are built with [`SectionCharacteristics::from_bits_retain`], so undefined bits and
    /// the packed alignment field survive unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SectionCharacteristics: u32 {
        /// The section should not be padded to the next boundary (object files only)
        const TYPE_NO_PAD = 0x0000_0008;
        /// The section contains executable code
        const CNT_CODE = 0x0000_0020;
        /// The section contains initialized data
        const CNT_INITIALIZED_DATA = 0x0000_0040;
        /// The section contains uninitialized data
        const CNT_UNINITIALIZED_DATA = 0x0000_0080;
        /// Reserved for future use
        const LNK_OTHER = 0x0000_0100;
        /// The section contains comments or other information (object files only)
        const LNK_INFO = 0x0000_0200;
        /// The section will not become part of the image (object files only)
        const LNK_REMOVE = 0x0000_0800;
        /// The section contains COMDAT data (object files only)
        const LNK_COMDAT = 0x0000_1000;
        /// The section contains data referenced through the global pointer
        const GPREL = 0x0000_8000;
        /// Reserved for future use
        const MEM_PURGEABLE = 0x0002_0000;
        /// Reserved for future use
        const MEM_LOCKED = 0x0004_0000;
        /// Reserved for future use
        const MEM_PRELOAD = 0x0008_0000;
        /// The section contains extended relocations
        const LNK_NRELOC_OVFL = 0x0100_0000;
        /// The section can be discarded as needed
        const MEM_DISCARDABLE = 0x0200_0000;
        /// The section cannot be cached
        const MEM_NOT_CACHED = 0x0400_0000;
        /// The section is not pageable
        const MEM_NOT_PAGED = 0x0800_0000;
        /// The section can be shared in memory
        const MEM_SHARED = 0x1000_0000;
        /// The section can be executed as code
        const MEM_EXECUTE = 0x2000_0000;
        /// The section can be read
        const MEM_READ = 0x4000_0000;
        /// The section can be written to
        const MEM_WRITE = 0x8000_0000;
    }
}

impl SectionCharacteristics {
    /// Mask of the 4-bit alignment field (`IMAGE_SCN_ALIGN_*`).
    pub const ALIGN_MASK: u32 = 0x00F0_0000;

    /// Decodes the `IMAGE_SCN_ALIGN_*` field into a byte alignment.
    ///
    /// Returns `None` when the field is zero or holds the undefined value `0xF`.
    #[must_use]
    pub fn alignment(&self) -> Option<u32> {
        let field = (self.bits() & Self::ALIGN_MASK) >> 20;
        match field {
            1..=14 => Some(1 << (field - 1)),
            _ => None,
        }
    }
}

/// One bit of the optional header's `DllCharacteristics` word.
///
/// The enumeration is closed: each of the 16 bits maps to exactly one variant through
/// [`DLL_CHARACTERISTIC_BITS`], reserved bits included.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, EnumCount)]
pub enum DllCharacteristic {
    /// Reserved, bit 0
    Reserved1,
    /// Reserved, bit 1
    Reserved2,
    /// Reserved, bit 2
    Reserved3,
    /// Reserved, bit 3
    Reserved4,
    /// Reserved, bit 4
    Reserved5,
    /// The image can handle a high entropy 64-bit virtual address space
    HighEntropyVa,
    /// The DLL can be relocated at load time
    DynamicBase,
    /// Code integrity checks are enforced
    ForceIntegrity,
    /// The image is NX compatible
    NxCompat,
    /// Isolation aware, but do not isolate the image
    NoIsolation,
    /// Does not use structured exception handling
    NoSeh,
    /// Do not bind the image
    NoBind,
    /// The image must execute in an AppContainer
    AppContainer,
    /// A WDM driver
    WdmDriver,
    /// The image supports Control Flow Guard
    GuardCf,
    /// Terminal Server aware
    TerminalServerAware,
}

/// Mapping from every `DllCharacteristics` bit to its variant, in bit order.
pub const DLL_CHARACTERISTIC_BITS: [(u16, DllCharacteristic); 16] = [
    (0x0001, DllCharacteristic::Reserved1),
    (0x0002, DllCharacteristic::Reserved2),
    (0x0004, DllCharacteristic::Reserved3),
    (0x0008, DllCharacteristic::Reserved4),
    (0x0010, DllCharacteristic::Reserved5),
    (0x0020, DllCharacteristic::HighEntropyVa),
    (0x0040, DllCharacteristic::DynamicBase),
    (0x0080, DllCharacteristic::ForceIntegrity),
    (0x0100, DllCharacteristic::NxCompat),
    (0x0200, DllCharacteristic::NoIsolation),
    (0x0400, DllCharacteristic::NoSeh),
    (0x0800, DllCharacteristic::NoBind),
    (0x1000, DllCharacteristic::AppContainer),
    (0x2000, DllCharacteristic::WdmDriver),
    (0x4000, DllCharacteristic::GuardCf),
    (0x8000, DllCharacteristic::TerminalServerAware),
];

impl DllCharacteristic {
    /// The bit this variant stands for.
    #[must_use]
    pub fn mask(self) -> u16 {
        DLL_CHARACTERISTIC_BITS
            .iter()
            .find(|(_, flag)| *flag == self)
            .map_or(0, |(mask, _)| *mask)
    }

    /// Returns `true` for the bits the format reserves.
    #[must_use]
    pub fn is_reserved(self) -> bool {
        matches!(
            self,
            DllCharacteristic::Reserved1
                | DllCharacteristic::Reserved2
                | DllCharacteristic::Reserved3
                | DllCharacteristic::Reserved4
                | DllCharacteristic::Reserved5
        )
    }

    /// Decodes a raw `DllCharacteristics` word into its set variants, in bit order.
    #[must_use]
    pub fn from_raw(raw: u16) -> Vec<DllCharacteristic> {
        DLL_CHARACTERISTIC_BITS
            .iter()
            .filter(|(mask, _)| raw & mask != 0)
            .map(|(_, flag)| *flag)
            .collect()
    }

    /// Encodes a set of variants back into the raw word.
    pub fn to_raw<'a>(flags: impl IntoIterator<Item = &'a DllCharacteristic>) -> u16 {
        flags.into_iter().fold(0, |raw, flag| raw | flag.mask())
    }
}
