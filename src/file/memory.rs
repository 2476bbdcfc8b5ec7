//! In-memory backend for samples that never touch the disk.
//!
//! Used for buffers handed over by callers (network captures, unpacked layers, fuzz inputs)
//! and by every test in the crate.

use super::{bounded_slice, Backend};
use crate::Result;

/// A sample owned as a heap buffer.
#[derive(Debug)]
pub struct Memory {
    data: Box<[u8]>,
}

impl Memory {
    /// Takes ownership of `data`.
    pub fn new(data: Vec<u8>) -> Memory {
        Memory {
            data: data.into_boxed_slice(),
        }
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        bounded_slice(&self.data, offset, len)
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
