//! Page identifiers for VesperDB storage.

use serde::{Deserialize, Serialize};

/// Page size in bytes (8 KB). Part of the on-disk format.
pub const PAGE_SIZE: usize = 8 * 1024;

/// Unique identifier for a page within the engine.
///
/// A PageId pairs a file ID (assigned by the disk manager when a file is
/// attached) with a page number inside that file. Page number 0 is reserved
/// in index files and never names a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId {
    /// File identifier assigned at attach time.
    pub file_id: u32,
    /// Page number within the file.
    pub page_num: u32,
}

impl PageId {
    /// Creates a new PageId.
    pub fn new(file_id: u32, page_num: u32) -> Self {
        Self { file_id, page_num }
    }

    /// Packs the PageId into a single u64 (file_id in the upper half).
    pub fn as_u64(&self) -> u64 {
        ((self.file_id as u64) << 32) | (self.page_num as u64)
    }

    /// Unpacks a PageId from its u64 representation.
    pub fn from_u64(value: u64) -> Self {
        Self {
            file_id: (value >> 32) as u32,
            page_num: value as u32,
        }
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file_id, self.page_num)
    }
}
