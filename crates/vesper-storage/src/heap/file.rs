//! Heap file for relation records, backed by the buffer pool.
//!
//! All page I/O is routed through the buffer pool. Pages are fetched from
//! the pool, modified in memory, marked dirty, and written back on flush
//! or eviction.

use crate::disk::DiskManager;
use crate::heap::page::{HeapPage, SlotId};
use crate::rid::Rid;
use bytes::Bytes;
use std::sync::Arc;
use vesper_common::page::{PageId, PAGE_SIZE};
use vesper_common::{Result, VesperError};

/// A relation heap file storing variable-length records.
///
/// Records are appended to the tail page and never moved, so a record's
/// `Rid` is stable for the lifetime of the file.
pub struct HeapFile {
    /// Disk manager for page I/O.
    disk: Arc<DiskManager>,
    /// Buffer pool for page caching.
    pool: Arc<vesper_buffer::BufferPool>,
    /// File id assigned at attach time.
    file_id: u32,
    /// Relation name (also the file name).
    name: String,
}

impl HeapFile {
    /// Creates a new heap file for a relation.
    pub fn create(
        disk: Arc<DiskManager>,
        pool: Arc<vesper_buffer::BufferPool>,
        name: &str,
    ) -> Result<Self> {
        let file_id = disk.create_file(name)?;
        Ok(Self {
            disk,
            pool,
            file_id,
            name: name.to_string(),
        })
    }

    /// Opens an existing heap file.
    pub fn open(
        disk: Arc<DiskManager>,
        pool: Arc<vesper_buffer::BufferPool>,
        name: &str,
    ) -> Result<Self> {
        let file_id = disk.open_file(name)?;
        Ok(Self {
            disk,
            pool,
            file_id,
            name: name.to_string(),
        })
    }

    /// Returns the relation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of pages in the file.
    pub fn num_pages(&self) -> Result<u32> {
        self.disk.num_pages(self.file_id)
    }

    /// Ensures a page is resident and pinned, loading it from disk on miss.
    fn fetch_pinned(&self, page_num: u32) -> Result<&vesper_buffer::Frame> {
        let page_id = PageId::new(self.file_id, page_num);
        if let Some(frame) = self.pool.fetch_page(page_id) {
            return Ok(frame);
        }

        let data = self.disk.read_page(page_id)?;
        let (frame, evicted) = self.pool.load_page(page_id, &data)?;
        if let Some(evicted) = evicted {
            if let Err(e) = self.disk.write_page(evicted.page_id, &evicted.data) {
                self.pool.unpin_page(page_id, false)?;
                return Err(e);
            }
        }
        Ok(frame)
    }

    /// Copies a page's bytes out of the pool (loading it on miss).
    fn read_page_bytes(&self, page_num: u32) -> Result<[u8; PAGE_SIZE]> {
        let frame = self.fetch_pinned(page_num)?;
        let data: [u8; PAGE_SIZE] = **frame.read_data();
        self.pool
            .unpin_page(PageId::new(self.file_id, page_num), false)?;
        Ok(data)
    }

    /// Appends a record, returning its Rid.
    pub fn append(&self, record: &[u8]) -> Result<Rid> {
        let num_pages = self.num_pages()?;

        // Tail page first
        if num_pages > 0 {
            let tail = num_pages - 1;
            if let Some(rid) = self.try_insert_at(tail, record)? {
                return Ok(rid);
            }
        }

        // Tail full (or empty file): extend with a fresh page
        let page_id = self.disk.allocate_page(self.file_id)?;
        let (frame, evicted) = self.pool.new_page(page_id)?;
        if let Some(evicted) = evicted {
            if let Err(e) = self.disk.write_page(evicted.page_id, &evicted.data) {
                self.pool.unpin_page(page_id, false)?;
                return Err(e);
            }
        }

        let result = {
            let mut data = frame.write_data();
            HeapPage::insert_into(&mut **data, record)
        };
        match result {
            Ok(slot) => {
                self.pool.unpin_page(page_id, true)?;
                Ok(Rid::new(page_id.page_num, slot.0))
            }
            Err(e) => {
                self.pool.unpin_page(page_id, false)?;
                Err(e)
            }
        }
    }

    /// Tries to insert into an existing page. Returns None when full.
    fn try_insert_at(&self, page_num: u32, record: &[u8]) -> Result<Option<Rid>> {
        let page_id = PageId::new(self.file_id, page_num);
        let frame = self.fetch_pinned(page_num)?;

        let result = {
            let mut data = frame.write_data();
            HeapPage::insert_into(&mut **data, record)
        };
        match result {
            Ok(slot) => {
                self.pool.unpin_page(page_id, true)?;
                Ok(Some(Rid::new(page_num, slot.0)))
            }
            Err(VesperError::PageFull) => {
                self.pool.unpin_page(page_id, false)?;
                Ok(None)
            }
            Err(e) => {
                self.pool.unpin_page(page_id, false)?;
                Err(e)
            }
        }
    }

    /// Reads the record a Rid points at.
    pub fn record(&self, rid: Rid) -> Result<Bytes> {
        let data = self.read_page_bytes(rid.page_no)?;
        HeapPage::record_in(&data, SlotId(rid.slot_no))
            .map(Bytes::copy_from_slice)
            .ok_or_else(|| VesperError::Internal(format!("no record at rid {}", rid)))
    }

    /// Starts a sequential scan over all records.
    pub fn scan(&self) -> FileScan<'_> {
        FileScan {
            heap: self,
            page_num: 0,
            slot: 0,
            page: None,
        }
    }

    /// Writes all of this file's dirty pages to disk and syncs the file.
    pub fn flush(&self) -> Result<()> {
        self.pool
            .flush_file(self.file_id, |page_id, data| {
                let mut buf = [0u8; PAGE_SIZE];
                buf.copy_from_slice(data);
                self.disk.write_page(page_id, &buf)
            })?;
        self.disk.sync_file(self.file_id)
    }
}

/// Sequential scanner over a heap file.
///
/// Yields `(Rid, record)` pairs in file order and signals end-of-input
/// with `EndOfFile`.
pub struct FileScan<'a> {
    heap: &'a HeapFile,
    page_num: u32,
    slot: u16,
    page: Option<HeapPage>,
}

impl FileScan<'_> {
    /// Returns the next record, or `EndOfFile` after the last one.
    pub fn next_record(&mut self) -> Result<(Rid, Bytes)> {
        loop {
            if self.page.is_none() {
                if self.page_num >= self.heap.num_pages()? {
                    return Err(VesperError::EndOfFile);
                }
                let data = self.heap.read_page_bytes(self.page_num)?;
                self.page = Some(HeapPage::from_bytes(data));
            }

            if let Some(page) = &self.page {
                if let Some(record) = page.record(SlotId(self.slot)) {
                    let rid = Rid::new(self.page_num, self.slot);
                    let bytes = Bytes::copy_from_slice(record);
                    self.slot += 1;
                    return Ok((rid, bytes));
                }
            }

            // Page exhausted
            self.page = None;
            self.page_num += 1;
            self.slot = 0;
        }
    }
}
