//! Lock-free page table mapping page IDs to buffer frames.

use crate::frame::FrameId;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use vesper_common::page::PageId;

/// Sentinel value for empty frame slots.
const EMPTY_FRAME: u32 = u32::MAX;

/// Sentinel value for empty key slots.
const EMPTY_KEY: u64 = u64::MAX;

/// Sentinel value for deleted key slots (tombstone).
const TOMBSTONE_KEY: u64 = u64::MAX - 1;

/// Lock-free open-addressing hash table from PageId to FrameId.
///
/// Keys are the packed u64 form of the PageId; removal leaves tombstones so
/// probe chains stay intact.
pub struct PageTable {
    /// Hash table keys (packed PageId).
    keys: Box<[AtomicU64]>,
    /// Hash table values (frame ids).
    values: Box<[AtomicU32]>,
    /// Bitmask for table indexing (table size - 1).
    mask: usize,
}

impl PageTable {
    /// Creates a page table sized for the given number of frames.
    pub fn new(capacity: usize) -> Self {
        // Next power of 2, 2x capacity for ~50% load factor
        let size = (capacity * 2).next_power_of_two().max(1024);

        let keys: Box<[AtomicU64]> = (0..size).map(|_| AtomicU64::new(EMPTY_KEY)).collect();
        let values: Box<[AtomicU32]> = (0..size).map(|_| AtomicU32::new(EMPTY_FRAME)).collect();

        Self {
            keys,
            values,
            mask: size - 1,
        }
    }

    #[inline(always)]
    fn slot_for(&self, key: u64) -> usize {
        // FxHash-style multiply for distribution
        let hash = key.wrapping_mul(0x517cc1b727220a95);
        (hash as usize) & self.mask
    }

    /// Looks up a page and returns its frame if present.
    #[inline]
    pub fn get(&self, page_id: PageId) -> Option<FrameId> {
        let key = page_id.as_u64();
        let mut idx = self.slot_for(key);

        for _ in 0..self.keys.len() {
            let stored = self.keys[idx].load(Ordering::Acquire);
            if stored == EMPTY_KEY {
                return None;
            }
            if stored == key {
                return Some(FrameId(self.values[idx].load(Ordering::Acquire)));
            }
            idx = (idx + 1) & self.mask;
        }
        None
    }

    /// Inserts or updates a mapping. Returns false if the table is full.
    pub fn insert(&self, page_id: PageId, frame_id: FrameId) -> bool {
        let key = page_id.as_u64();
        let mut idx = self.slot_for(key);

        for _ in 0..self.keys.len() {
            let stored = self.keys[idx].load(Ordering::Acquire);
            if stored == EMPTY_KEY || stored == TOMBSTONE_KEY {
                self.values[idx].store(frame_id.0, Ordering::Release);
                self.keys[idx].store(key, Ordering::Release);
                return true;
            }
            if stored == key {
                self.values[idx].store(frame_id.0, Ordering::Release);
                return true;
            }
            idx = (idx + 1) & self.mask;
        }
        false
    }

    /// Removes a mapping, returning the frame it pointed at.
    pub fn remove(&self, page_id: PageId) -> Option<FrameId> {
        let key = page_id.as_u64();
        let mut idx = self.slot_for(key);

        for _ in 0..self.keys.len() {
            let stored = self.keys[idx].load(Ordering::Acquire);
            if stored == EMPTY_KEY {
                return None;
            }
            if stored == key {
                let frame_id = self.values[idx].load(Ordering::Acquire);
                self.keys[idx].store(TOMBSTONE_KEY, Ordering::Release);
                return Some(FrameId(frame_id));
            }
            idx = (idx + 1) & self.mask;
        }
        None
    }

    /// Returns true if the page is mapped.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.get(page_id).is_some()
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.keys
            .iter()
            .filter(|slot| {
                let key = slot.load(Ordering::Relaxed);
                key != EMPTY_KEY && key != TOMBSTONE_KEY
            })
            .count()
    }

    /// Returns true if the table has no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls `f` for every live entry. Stops early if `f` returns false.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(PageId, FrameId) -> bool,
    {
        for (idx, key_slot) in self.keys.iter().enumerate() {
            let key = key_slot.load(Ordering::Relaxed);
            if key != EMPTY_KEY && key != TOMBSTONE_KEY {
                let frame_id = FrameId(self.values[idx].load(Ordering::Relaxed));
                if !f(PageId::from_u64(key), frame_id) {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get() {
        let table = PageTable::new(64);
        let page_id = PageId::new(1, 42);

        assert!(table.insert(page_id, FrameId(7)));
        assert_eq!(table.get(page_id), Some(FrameId(7)));
        assert!(table.contains(page_id));
    }

    #[test]
    fn test_get_missing() {
        let table = PageTable::new(64);
        assert_eq!(table.get(PageId::new(0, 0)), None);
    }

    #[test]
    fn test_remove() {
        let table = PageTable::new(64);
        let page_id = PageId::new(1, 42);

        table.insert(page_id, FrameId(7));
        assert_eq!(table.remove(page_id), Some(FrameId(7)));
        assert_eq!(table.get(page_id), None);
        assert_eq!(table.remove(page_id), None);
    }

    #[test]
    fn test_reinsert_after_remove() {
        let table = PageTable::new(64);
        let page_id = PageId::new(2, 5);

        table.insert(page_id, FrameId(1));
        table.remove(page_id);
        assert!(table.insert(page_id, FrameId(9)));
        assert_eq!(table.get(page_id), Some(FrameId(9)));
    }

    #[test]
    fn test_update_existing() {
        let table = PageTable::new(64);
        let page_id = PageId::new(0, 42);

        table.insert(page_id, FrameId(1));
        table.insert(page_id, FrameId(2));
        assert_eq!(table.get(page_id), Some(FrameId(2)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_len_and_for_each() {
        let table = PageTable::new(64);
        table.insert(PageId::new(0, 1), FrameId(1));
        table.insert(PageId::new(0, 2), FrameId(2));
        table.insert(PageId::new(1, 1), FrameId(3));

        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());

        let mut seen = 0;
        table.for_each(|_, _| {
            seen += 1;
            true
        });
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_many_entries() {
        let table = PageTable::new(512);
        for i in 0..500 {
            assert!(table.insert(PageId::new(3, i), FrameId(i)));
        }
        for i in 0..500 {
            assert_eq!(table.get(PageId::new(3, i)), Some(FrameId(i)));
        }
        assert_eq!(table.len(), 500);
    }
}
