//! Little-endian, bounds-checked reading of primitive values.
//!
//! Every multi-byte field in a PE image is stored little-endian. This module provides the
//! [`crate::file::io::PeIO`] trait together with [`crate::file::io::read_le`] and
//! [`crate::file::io::read_le_at`], which the [`crate::file::parser::Parser`] and the
//! directory table parsers build upon.
//!
//! All functions return [`crate::Error::OutOfBounds`] instead of panicking when the buffer
//! is too short, so a truncated table can never cause a read past the end of its window.
//!
//! # Examples
//!
//! ```rust,ignore
//! use pescope::file::io::read_le_at;
//!
//! let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
//! let mut offset = 0;
//!
//! let first: u16 = read_le_at(&data, &mut offset)?;
//! let second: u32 = read_le_at(&data, &mut offset)?;
//! assert_eq!((first, second, offset), (1, 2, 6));
//! # Ok::<(), pescope::Error>(())
//! ```

use crate::Result;

/// Trait for primitive types that can be decoded from a little-endian byte array.
///
/// Each implementation names the fixed-size array it is decoded from through the
/// `Bytes` associated type (e.g. `[u8; 4]` for `u32`).
pub trait PeIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_pe_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PeIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_pe_io!(u8, u16, u32, u64, i16, i32, i64);

/// Safely reads a value of type `T` in little-endian byte order from the start of `data`.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le<T: PeIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`, advancing
/// `offset` by the size of `T`.
///
/// The offset is left untouched when the read fails.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes, including when
/// `offset + size_of::<T>()` would overflow.
pub fn read_le_at<T: PeIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };

    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}
