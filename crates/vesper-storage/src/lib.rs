//! Storage engine for VesperDB.
//!
//! This crate provides:
//! - Disk manager for page-level I/O over named files
//! - Heap files for relation records, scanned during index construction
//! - A disk-resident B+ tree index over one attribute of a relation

mod disk;
mod heap;
mod index;
mod rid;

pub use disk::{DiskManager, DiskManagerConfig};
pub use heap::{FileScan, HeapFile, HeapPage, SlotId, MAX_RECORD_SIZE};
pub use index::{
    branch_capacity, index_file_name, leaf_capacity, AnyIndex, BranchMut, BranchRef, Index,
    IndexHeader, IndexKey, LeafMut, LeafRef, ScanOp, StrKey, BRANCH_CAP_DOUBLE, BRANCH_CAP_INT,
    BRANCH_CAP_STR, LEAF_CAP_DOUBLE, LEAF_CAP_INT, LEAF_CAP_STR,
};
pub use rid::Rid;
