//! Disk-resident B+ tree index.
//!
//! The index maps one fixed-width attribute of a relation to Rids in the
//! relation's heap file. It lives in its own page file, runs entirely on
//! top of the buffer pool, and supports bulk construction from a relation
//! scan, single-entry insertion, and range scans with open/closed
//! endpoints.
//!
//! File layout (page numbers within the index file):
//!
//! ```text
//! page 0   reserved ("no page" sentinel)
//! page 1   header: relation name, attribute offset/type, root location
//! page 2+  tree nodes, allocated on demand during splits
//! ```
//!
//! Leaves hold `(key, rid)` entries in ascending key order and chain to
//! their right siblings, so a range scan seeks once and then walks the
//! chain. Branches hold separator keys and child page numbers; splits
//! copy up the right leaf's first key (leaves) or push up the middle key
//! (branches). The tree has no parent pointers: insertion records its
//! descent path and propagates splits back along it.

pub mod driver;
pub mod key;
pub mod layout;
pub mod node;
pub mod scan;

pub use driver::{index_file_name, AnyIndex, Index};
pub use key::{IndexKey, StrKey};
pub use layout::{
    branch_capacity, leaf_capacity, IndexHeader, BRANCH_CAP_DOUBLE, BRANCH_CAP_INT,
    BRANCH_CAP_STR, LEAF_CAP_DOUBLE, LEAF_CAP_INT, LEAF_CAP_STR,
};
pub use node::{BranchMut, BranchRef, LeafMut, LeafRef};
pub use scan::ScanOp;
