//! Open and create options

use crate::io::ByteOrder;

/// Options for opening an existing file for reading
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReadOptions {
    /// Serve strip data from a memory map instead of seek + read
    pub use_mmap: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { use_mmap: true }
    }
}

impl ReadOptions {
    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }
}

/// Options for creating a new file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WriteOptions {
    /// Write a BigTIFF (64-bit offsets) instead of a classic TIFF
    pub big_tiff: bool,
    pub byte_order: ByteOrder,
}

impl WriteOptions {
    pub fn with_big_tiff(mut self, big_tiff: bool) -> Self {
        self.big_tiff = big_tiff;
        self
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }
}
