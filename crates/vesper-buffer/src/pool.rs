//! Buffer pool manager.

use crate::frame::{Frame, FrameId};
use crate::page_table::PageTable;
use crate::replacer::{ClockReplacer, Replacer};
use parking_lot::Mutex;
use sysinfo::System;
use vesper_common::page::{PageId, PAGE_SIZE};
use vesper_common::{Result, StorageConfig, VesperError};

/// A dirty page that was evicted from the pool. The caller must write it
/// to disk before the page is considered durable.
#[derive(Debug)]
pub struct EvictedPage {
    pub page_id: PageId,
    pub data: Box<[u8; PAGE_SIZE]>,
}

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub num_frames: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self { num_frames: 1024 }
    }
}

impl From<&StorageConfig> for BufferPoolConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            num_frames: config.buffer_pool_pages,
        }
    }
}

/// Buffer pool manager.
///
/// Hands out pinned page frames backed by a fixed array:
/// - page ID to frame ID mapping (lock-free page table)
/// - free frame list for new pages
/// - clock replacement among unpinned frames
/// - pin counting and dirty tracking per frame
pub struct BufferPool {
    /// Configuration.
    config: BufferPoolConfig,
    /// Array of frames.
    frames: Vec<Frame>,
    /// Page ID to frame ID mapping.
    page_table: PageTable,
    /// List of free frame IDs.
    free_list: Mutex<Vec<FrameId>>,
    /// Page replacement policy.
    replacer: ClockReplacer,
}

impl BufferPool {
    /// Creates a new buffer pool.
    pub fn new(config: BufferPoolConfig) -> Self {
        let num_frames = config.num_frames;

        let frames: Vec<_> = (0..num_frames)
            .map(|i| Frame::new(FrameId(i as u32)))
            .collect();
        let free_list: Vec<_> = (0..num_frames).map(|i| FrameId(i as u32)).collect();

        Self {
            config,
            frames,
            page_table: PageTable::new(num_frames),
            free_list: Mutex::new(free_list),
            replacer: ClockReplacer::new(num_frames),
        }
    }

    /// Creates a buffer pool sized to 25% of available system RAM, with a
    /// floor of 1,000 frames so small machines still cache usefully.
    pub fn auto_sized() -> Self {
        let mut sys = System::new_all();
        sys.refresh_memory();

        let available_bytes = sys.available_memory() as usize;
        let num_frames = (available_bytes / 4 / PAGE_SIZE).max(1_000);

        Self::new(BufferPoolConfig { num_frames })
    }

    /// Returns the number of frames in the pool.
    pub fn num_frames(&self) -> usize {
        self.config.num_frames
    }

    /// Returns the number of free frames.
    pub fn free_count(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Returns the number of pages currently resident.
    pub fn page_count(&self) -> usize {
        self.page_table.len()
    }

    /// Returns true if the page is resident in the pool.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.page_table.contains(page_id)
    }

    /// Fetches a resident page, pinning its frame.
    ///
    /// Returns None if the page is not in the pool; the caller is expected
    /// to load it from disk via `load_page`.
    #[inline]
    pub fn fetch_page(&self, page_id: PageId) -> Option<&Frame> {
        let frame_id = self.page_table.get(page_id)?;
        let frame = &self.frames[frame_id.0 as usize];
        frame.pin();
        self.replacer.record_access(frame_id);
        Some(frame)
    }

    /// Acquires a frame for a new page: free list first, then eviction.
    fn allocate_frame(&self) -> Result<(FrameId, Option<EvictedPage>)> {
        {
            let mut free_list = self.free_list.lock();
            if let Some(frame_id) = free_list.pop() {
                return Ok((frame_id, None));
            }
        }

        let victim = self.replacer.evict(&|fid| {
            let frame = &self.frames[fid.0 as usize];
            !frame.is_empty() && frame.pin_count() == 0
        });

        if let Some(victim_id) = victim {
            let frame = &self.frames[victim_id.0 as usize];

            let evicted = match (frame.is_dirty(), frame.page_id()) {
                (true, Some(page_id)) => {
                    let guard = frame.read_data();
                    let mut data = Box::new([0u8; PAGE_SIZE]);
                    data.copy_from_slice(&**guard);
                    drop(guard);
                    Some(EvictedPage { page_id, data })
                }
                _ => None,
            };

            if let Some(old_page_id) = frame.page_id() {
                self.page_table.remove(old_page_id);
            }

            return Ok((victim_id, evicted));
        }

        Err(VesperError::BufferPoolFull)
    }

    /// Installs a new (zeroed) page in the pool, pinned.
    ///
    /// If the page is already resident, the existing frame is pinned and
    /// returned instead. The second tuple element is any dirty page that
    /// was evicted to make room; the caller must write it back.
    pub fn new_page(&self, page_id: PageId) -> Result<(&Frame, Option<EvictedPage>)> {
        if let Some(frame_id) = self.page_table.get(page_id) {
            let frame = &self.frames[frame_id.0 as usize];
            frame.pin();
            self.replacer.record_access(frame_id);
            return Ok((frame, None));
        }

        let (frame_id, evicted) = self.allocate_frame()?;

        let frame = &self.frames[frame_id.0 as usize];
        frame.reset();
        frame.set_page_id(Some(page_id));
        frame.pin();

        self.page_table.insert(page_id, frame_id);

        Ok((frame, evicted))
    }

    /// Loads page bytes (read from disk by the caller) into the pool, pinned.
    pub fn load_page(&self, page_id: PageId, data: &[u8]) -> Result<(&Frame, Option<EvictedPage>)> {
        let (frame, evicted) = self.new_page(page_id)?;
        frame.copy_from(data);
        Ok((frame, evicted))
    }

    /// Unpins a page, optionally marking it dirty.
    ///
    /// Unpinning a page that is not resident or not pinned is a caller
    /// contract violation (`PageNotFound` / `PageNotPinned`).
    pub fn unpin_page(&self, page_id: PageId, dirty: bool) -> Result<()> {
        let frame_id = self
            .page_table
            .get(page_id)
            .ok_or(VesperError::PageNotFound { page_id })?;
        let frame = &self.frames[frame_id.0 as usize];

        if dirty {
            frame.set_dirty(true);
        }
        frame.unpin()?;
        Ok(())
    }

    /// Flushes a single page through the callback if it is dirty.
    ///
    /// Returns true if the page was written.
    pub fn flush_page<F>(&self, page_id: PageId, mut flush_fn: F) -> Result<bool>
    where
        F: FnMut(PageId, &[u8]) -> Result<()>,
    {
        if let Some(frame_id) = self.page_table.get(page_id) {
            let frame = &self.frames[frame_id.0 as usize];
            if frame.is_dirty() {
                let data = frame.read_data();
                flush_fn(page_id, &**data)?;
                frame.set_dirty(false);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Flushes all dirty pages. Returns the number of pages written.
    pub fn flush_all<F>(&self, mut flush_fn: F) -> Result<usize>
    where
        F: FnMut(PageId, &[u8]) -> Result<()>,
    {
        let mut pages = Vec::new();
        self.page_table.for_each(|page_id, frame_id| {
            pages.push((page_id, frame_id));
            true
        });

        let mut flushed = 0;
        for (page_id, frame_id) in pages {
            let frame = &self.frames[frame_id.0 as usize];
            if frame.is_dirty() {
                let data = frame.read_data();
                flush_fn(page_id, &**data)?;
                frame.set_dirty(false);
                flushed += 1;
            }
        }
        Ok(flushed)
    }

    /// Flushes one file's pages and drops them from the pool.
    ///
    /// Dirty pages are written through the callback, clean ones are simply
    /// disposed. Fails with `PagePinned` before touching anything if any of
    /// the file's pages is still pinned.
    pub fn flush_file<F>(&self, file_id: u32, mut flush_fn: F) -> Result<usize>
    where
        F: FnMut(PageId, &[u8]) -> Result<()>,
    {
        let mut pages = Vec::new();
        self.page_table.for_each(|page_id, frame_id| {
            if page_id.file_id == file_id {
                pages.push((page_id, frame_id));
            }
            true
        });

        for &(page_id, frame_id) in &pages {
            if self.frames[frame_id.0 as usize].is_pinned() {
                return Err(VesperError::PagePinned { page_id });
            }
        }

        let mut flushed = 0;
        for (page_id, frame_id) in pages {
            let frame = &self.frames[frame_id.0 as usize];
            if frame.is_dirty() {
                let data = frame.read_data();
                flush_fn(page_id, &**data)?;
                drop(data);
                flushed += 1;
            }
            self.page_table.remove(page_id);
            self.replacer.remove(frame_id);
            frame.reset();
            self.free_list.lock().push(frame_id);
        }
        Ok(flushed)
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let mut pinned_frames = 0;
        let mut dirty_frames = 0;

        self.page_table.for_each(|_, frame_id| {
            let frame = &self.frames[frame_id.0 as usize];
            if frame.is_pinned() {
                pinned_frames += 1;
            }
            if frame.is_dirty() {
                dirty_frames += 1;
            }
            true
        });

        BufferPoolStats {
            total_frames: self.config.num_frames,
            free_frames: self.free_count(),
            used_frames: self.page_table.len(),
            pinned_frames,
            dirty_frames,
        }
    }
}

/// Statistics about the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolStats {
    /// Total number of frames.
    pub total_frames: usize,
    /// Number of free frames.
    pub free_frames: usize,
    /// Number of frames holding pages.
    pub used_frames: usize,
    /// Number of pinned frames.
    pub pinned_frames: usize,
    /// Number of dirty frames.
    pub dirty_frames: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_pool(num_frames: usize) -> BufferPool {
        BufferPool::new(BufferPoolConfig { num_frames })
    }

    #[test]
    fn test_pool_new() {
        let pool = create_test_pool(10);
        assert_eq!(pool.num_frames(), 10);
        assert_eq!(pool.free_count(), 10);
        assert_eq!(pool.page_count(), 0);
    }

    #[test]
    fn test_pool_config_from_storage_config() {
        let storage = StorageConfig {
            buffer_pool_pages: 8,
            ..Default::default()
        };
        let pool = BufferPool::new(BufferPoolConfig::from(&storage));
        assert_eq!(pool.num_frames(), 8);
    }

    #[test]
    fn test_pool_new_page() {
        let pool = create_test_pool(10);
        let page_id = PageId::new(0, 1);

        let (frame, evicted) = pool.new_page(page_id).unwrap();

        assert!(evicted.is_none());
        assert_eq!(frame.page_id(), Some(page_id));
        assert!(frame.is_pinned());
        assert_eq!(pool.free_count(), 9);
        assert!(pool.contains(page_id));
    }

    #[test]
    fn test_pool_fetch_existing() {
        let pool = create_test_pool(10);
        let page_id = PageId::new(0, 1);

        pool.new_page(page_id).unwrap();
        pool.unpin_page(page_id, false).unwrap();

        let frame = pool.fetch_page(page_id).unwrap();
        assert_eq!(frame.page_id(), Some(page_id));
        assert!(frame.is_pinned());
    }

    #[test]
    fn test_pool_fetch_nonexistent() {
        let pool = create_test_pool(10);
        assert!(pool.fetch_page(PageId::new(0, 1)).is_none());
    }

    #[test]
    fn test_pool_unpin_contract() {
        let pool = create_test_pool(10);
        let page_id = PageId::new(0, 1);

        // Unpinning a page that was never loaded
        let err = pool.unpin_page(page_id, false).unwrap_err();
        assert!(matches!(err, VesperError::PageNotFound { .. }));

        pool.new_page(page_id).unwrap();
        pool.unpin_page(page_id, false).unwrap();

        // Unpinning twice
        let err = pool.unpin_page(page_id, false).unwrap_err();
        assert!(matches!(err, VesperError::PageNotPinned { .. }));
    }

    #[test]
    fn test_pool_dirty_tracking() {
        let pool = create_test_pool(10);
        let page_id = PageId::new(0, 1);

        pool.new_page(page_id).unwrap();
        pool.unpin_page(page_id, true).unwrap();

        let frame = pool.fetch_page(page_id).unwrap();
        assert!(frame.is_dirty());
    }

    #[test]
    fn test_pool_eviction_clean() {
        let pool = create_test_pool(3);

        for i in 0..3 {
            let page_id = PageId::new(0, i);
            pool.new_page(page_id).unwrap();
            pool.unpin_page(page_id, false).unwrap();
        }
        assert_eq!(pool.free_count(), 0);

        let new_page_id = PageId::new(0, 99);
        let (_, evicted) = pool.new_page(new_page_id).unwrap();

        assert!(evicted.is_none());
        assert_eq!(pool.page_count(), 3);
        assert!(pool.contains(new_page_id));
    }

    #[test]
    fn test_pool_eviction_returns_dirty_page() {
        let pool = create_test_pool(1);
        let page_id1 = PageId::new(0, 1);

        let (frame, _) = pool.new_page(page_id1).unwrap();
        frame.write_data()[0] = 0xAB;
        pool.unpin_page(page_id1, true).unwrap();

        let (_, evicted) = pool.new_page(PageId::new(0, 2)).unwrap();

        let evicted = evicted.expect("dirty page should surface on eviction");
        assert_eq!(evicted.page_id, page_id1);
        assert_eq!(evicted.data[0], 0xAB);
    }

    #[test]
    fn test_pool_full_when_all_pinned() {
        let pool = create_test_pool(2);

        pool.new_page(PageId::new(0, 1)).unwrap();
        pool.new_page(PageId::new(0, 2)).unwrap();

        let result = pool.new_page(PageId::new(0, 3));
        assert!(matches!(result, Err(VesperError::BufferPoolFull)));
    }

    #[test]
    fn test_pool_load_page() {
        let pool = create_test_pool(10);
        let page_id = PageId::new(0, 1);
        let data = [0xABu8; PAGE_SIZE];

        let (frame, _) = pool.load_page(page_id, &data).unwrap();
        assert_eq!(frame.read_data()[100], 0xAB);
    }

    #[test]
    fn test_pool_flush_page() {
        let pool = create_test_pool(10);
        let page_id = PageId::new(0, 1);

        pool.new_page(page_id).unwrap();
        pool.unpin_page(page_id, true).unwrap();

        let mut flushed_pages = vec![];
        let wrote = pool
            .flush_page(page_id, |pid, _| {
                flushed_pages.push(pid);
                Ok(())
            })
            .unwrap();

        assert!(wrote);
        assert_eq!(flushed_pages, vec![page_id]);

        let frame = pool.fetch_page(page_id).unwrap();
        assert!(!frame.is_dirty());
    }

    #[test]
    fn test_pool_flush_all() {
        let pool = create_test_pool(10);

        for i in 0..5 {
            let page_id = PageId::new(0, i);
            pool.new_page(page_id).unwrap();
            pool.unpin_page(page_id, true).unwrap();
        }

        let mut count = 0;
        let flushed = pool
            .flush_all(|_, _| {
                count += 1;
                Ok(())
            })
            .unwrap();

        assert_eq!(flushed, 5);
        assert_eq!(count, 5);
    }

    #[test]
    fn test_pool_flush_file_rejects_pinned() {
        let pool = create_test_pool(10);
        let page_id = PageId::new(7, 1);

        pool.new_page(page_id).unwrap();
        // Still pinned

        let err = pool.flush_file(7, |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, VesperError::PagePinned { page_id: p } if p == page_id));
    }

    #[test]
    fn test_pool_flush_file_disposes_pages() {
        let pool = create_test_pool(10);

        // Two dirty pages in file 7, one clean page in file 8
        for i in 1..=2 {
            let page_id = PageId::new(7, i);
            pool.new_page(page_id).unwrap();
            pool.unpin_page(page_id, true).unwrap();
        }
        let other = PageId::new(8, 1);
        pool.new_page(other).unwrap();
        pool.unpin_page(other, false).unwrap();

        let flushed = pool.flush_file(7, |_, _| Ok(())).unwrap();

        assert_eq!(flushed, 2);
        assert!(!pool.contains(PageId::new(7, 1)));
        assert!(!pool.contains(PageId::new(7, 2)));
        assert!(pool.contains(other));
        assert_eq!(pool.free_count(), 9);
    }

    #[test]
    fn test_pool_stats() {
        let pool = create_test_pool(10);

        for i in 0..4 {
            let page_id = PageId::new(0, i);
            pool.new_page(page_id).unwrap();
            if i % 2 == 0 {
                pool.unpin_page(page_id, true).unwrap();
            }
        }

        let stats = pool.stats();
        assert_eq!(stats.total_frames, 10);
        assert_eq!(stats.free_frames, 6);
        assert_eq!(stats.used_frames, 4);
        assert_eq!(stats.pinned_frames, 2);
        assert_eq!(stats.dirty_frames, 2);
    }

    #[test]
    fn test_pool_duplicate_new_page() {
        let pool = create_test_pool(10);
        let page_id = PageId::new(0, 1);

        pool.new_page(page_id).unwrap();
        pool.unpin_page(page_id, false).unwrap();

        let (frame, evicted) = pool.new_page(page_id).unwrap();
        assert!(evicted.is_none());
        assert_eq!(frame.page_id(), Some(page_id));
        assert_eq!(pool.page_count(), 1);
    }
}
