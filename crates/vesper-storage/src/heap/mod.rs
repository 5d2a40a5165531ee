//! Heap storage for relation records.
//!
//! This module provides:
//! - HeapPage: slotted page format for variable-length records
//! - HeapFile: append-only record storage addressed by Rid
//! - FileScan: sequential relation scanner feeding index construction

mod file;
mod page;

pub use file::{FileScan, HeapFile};
pub use page::{HeapPage, SlotId, MAX_RECORD_SIZE};
