//! Buffer pool management for VesperDB.
//!
//! This crate provides in-memory page caching with:
//! - Fixed-size buffer pool with configurable page count
//! - Clock eviction policy among unpinned frames
//! - Pin counting with explicit contract errors on misuse
//! - Dirty page tracking with per-file flush-and-dispose

mod frame;
mod page_table;
mod pool;
mod replacer;

pub use frame::{Frame, FrameId};
pub use pool::{BufferPool, BufferPoolConfig, BufferPoolStats, EvictedPage};
pub use replacer::{ClockReplacer, Replacer};
