//! B+ tree index driver: construction, insertion, and range scans.

use super::key::{IndexKey, StrKey};
use super::layout::{branch_capacity, leaf_capacity, IndexHeader, HEADER_PAGE_NUM, NO_PAGE};
use super::node::{BranchMut, BranchRef, LeafMut, LeafRef};
use super::scan::{validate_range, ScanCursor, ScanOp, ScanPos};
use crate::disk::DiskManager;
use crate::heap::HeapFile;
use crate::rid::Rid;
use std::cmp::Ordering;
use std::sync::Arc;
use vesper_buffer::{BufferPool, Frame};
use vesper_common::page::{PageId, PAGE_SIZE};
use vesper_common::types::KeyType;
use vesper_common::{Result, VesperError};

/// Deterministic index-file name for a relation and attribute offset.
pub fn index_file_name(relation_name: &str, attr_offset: u32) -> String {
    format!("{}.{}", relation_name, attr_offset)
}

/// A disk-resident B+ tree index over one attribute of a relation.
///
/// The index maps fixed-width keys to Rids in an external heap file. It is
/// generic over the key domain; `AnyIndex` provides the byte-keyed facade
/// that dispatches on the attribute type recorded in the header page.
pub struct Index<K: IndexKey> {
    /// Disk manager backing the index file.
    disk: Arc<DiskManager>,
    /// Buffer pool all page access goes through.
    pool: Arc<BufferPool>,
    /// File id of the index file.
    file_id: u32,
    /// Index file name, `"{relation}.{offset}"`.
    index_name: String,
    /// Indexed relation.
    relation_name: String,
    /// Byte offset of the indexed attribute within a record.
    attr_offset: u32,
    /// Cached root page number (mirrored in the header page).
    root_page_num: u32,
    /// Cached root-is-leaf flag (mirrored in the header page).
    root_is_leaf: bool,
    /// Active scan state, if any.
    scan: Option<ScanCursor<K>>,
}

impl<K: IndexKey> std::fmt::Debug for Index<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("index_name", &self.index_name)
            .field("relation_name", &self.relation_name)
            .field("attr_offset", &self.attr_offset)
            .finish()
    }
}

impl<K: IndexKey> Index<K> {
    /// Opens or builds the index for `(relation, attr_offset)`.
    ///
    /// If the index file already exists its header is verified against the
    /// requested parameters (`BadIndexInfo` on mismatch) and the root is
    /// cached. Otherwise the file is created and bulk-loaded from a full
    /// scan of the relation heap file.
    pub fn construct(
        disk: Arc<DiskManager>,
        pool: Arc<BufferPool>,
        relation_name: &str,
        attr_offset: u32,
    ) -> Result<Self> {
        let index_name = index_file_name(relation_name, attr_offset);
        if disk.exists(&index_name) {
            Self::open(disk, pool, relation_name, attr_offset)
        } else {
            let mut index = Self::create(disk, pool, relation_name, attr_offset)?;
            index.bulk_load()?;
            Ok(index)
        }
    }

    fn create(
        disk: Arc<DiskManager>,
        pool: Arc<BufferPool>,
        relation_name: &str,
        attr_offset: u32,
    ) -> Result<Self> {
        // Validates the relation name length before touching the disk
        let mut header = IndexHeader::new(relation_name, attr_offset, K::KIND)?;

        let index_name = index_file_name(relation_name, attr_offset);
        let file_id = disk.create_file(&index_name)?;

        // Page 0 is burned so that 0 can serve as the null page number;
        // the header lands at page 1 and the initial leaf root at page 2.
        disk.allocate_page(file_id)?;
        let header_page = disk.allocate_page(file_id)?;
        debug_assert_eq!(header_page.page_num, HEADER_PAGE_NUM);
        let root_page = disk.allocate_page(file_id)?;

        header.root_page_num = root_page.page_num;
        header.root_is_leaf = true;

        let index = Self {
            disk,
            pool,
            file_id,
            index_name,
            relation_name: relation_name.to_string(),
            attr_offset,
            root_page_num: root_page.page_num,
            root_is_leaf: true,
            scan: None,
        };

        index.with_page_mut(root_page.page_num, |data| {
            LeafMut::<K>::new(data).init();
        })?;
        index.with_page_mut(HEADER_PAGE_NUM, |data| {
            header.write_to(&mut data[..]);
        })?;
        Ok(index)
    }

    fn open(
        disk: Arc<DiskManager>,
        pool: Arc<BufferPool>,
        relation_name: &str,
        attr_offset: u32,
    ) -> Result<Self> {
        let index_name = index_file_name(relation_name, attr_offset);
        let file_id = disk.open_file(&index_name)?;

        let mut index = Self {
            disk,
            pool,
            file_id,
            index_name,
            relation_name: relation_name.to_string(),
            attr_offset,
            root_page_num: NO_PAGE,
            root_is_leaf: true,
            scan: None,
        };

        let header = index.with_page(HEADER_PAGE_NUM, |data| IndexHeader::read_from(&data[..]))??;
        header.verify(relation_name, attr_offset, K::KIND)?;

        index.root_page_num = header.root_page_num;
        index.root_is_leaf = header.root_is_leaf;
        Ok(index)
    }

    /// Drives the relation scanner and inserts one entry per record.
    /// `EndOfFile` from the scanner is normal termination, followed by a
    /// full flush of the index file.
    fn bulk_load(&mut self) -> Result<()> {
        let heap = HeapFile::open(self.disk.clone(), self.pool.clone(), &self.relation_name)?;
        let mut scan = heap.scan();
        loop {
            match scan.next_record() {
                Ok((rid, record)) => {
                    let key = self.extract_key(&record)?;
                    self.insert(key, rid)?;
                }
                Err(VesperError::EndOfFile) => break,
                Err(e) => return Err(e),
            }
        }
        self.flush()
    }

    /// Extracts the indexed key from raw record bytes. Nothing beyond
    /// `(attr_offset, key type)` is assumed about the record layout.
    fn extract_key(&self, record: &[u8]) -> Result<K> {
        let offset = self.attr_offset as usize;
        if offset >= record.len() {
            return Err(VesperError::InvalidKey(format!(
                "attribute offset {} beyond record of {} bytes",
                offset,
                record.len()
            )));
        }
        K::decode(&record[offset..])
    }

    /// Returns the index file name.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Returns the indexed relation name.
    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    /// Returns the attribute type this index was built over.
    pub fn key_type(&self) -> KeyType {
        K::KIND
    }

    /// Returns true while the root is still the initial leaf.
    pub fn root_is_leaf(&self) -> bool {
        self.root_is_leaf
    }

    /// Returns the tree height: 0 while the root is a leaf, otherwise the
    /// root's level (leaves sit at level 0).
    pub fn height(&self) -> Result<u32> {
        if self.root_is_leaf {
            return Ok(0);
        }
        self.with_page(self.root_page_num, |data| {
            BranchRef::<K>::new(data).level() as u32
        })
    }

    // ========================================================================
    // Page plumbing
    // ========================================================================

    #[inline]
    fn page_id(&self, page_num: u32) -> PageId {
        PageId::new(self.file_id, page_num)
    }

    /// Ensures a page is resident and pinned, loading it from disk on miss.
    /// Dirty pages evicted to make room are written back immediately.
    fn fetch_pinned(&self, page_num: u32) -> Result<&Frame> {
        let page_id = self.page_id(page_num);
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

    #[inline]
    fn unpin(&self, page_num: u32, dirty: bool) -> Result<()> {
        self.pool.unpin_page(self.page_id(page_num), dirty)
    }

    /// Runs a closure over a pinned page, unpinning clean afterwards.
    fn with_page<R>(&self, page_num: u32, f: impl FnOnce(&[u8; PAGE_SIZE]) -> R) -> Result<R> {
        let frame = self.fetch_pinned(page_num)?;
        let result = {
            let guard = frame.read_data();
            f(&guard)
        };
        self.unpin(page_num, false)?;
        Ok(result)
    }

    /// Runs a closure over a pinned page, unpinning dirty afterwards.
    fn with_page_mut<R>(
        &self,
        page_num: u32,
        f: impl FnOnce(&mut [u8; PAGE_SIZE]) -> R,
    ) -> Result<R> {
        let frame = self.fetch_pinned(page_num)?;
        let result = {
            let mut guard = frame.write_data();
            f(&mut guard)
        };
        self.unpin(page_num, true)?;
        Ok(result)
    }

    /// Allocates a fresh page at the end of the index file, pinned.
    fn alloc_pinned(&self) -> Result<(u32, &Frame)> {
        let page_id = self.disk.allocate_page(self.file_id)?;
        let (frame, evicted) = self.pool.new_page(page_id)?;
        if let Some(evicted) = evicted {
            if let Err(e) = self.disk.write_page(evicted.page_id, &evicted.data) {
                self.pool.unpin_page(page_id, false)?;
                return Err(e);
            }
        }
        Ok((page_id.page_num, frame))
    }

    /// Rewrites the header page from the cached metadata.
    fn write_header(&self) -> Result<()> {
        let header = IndexHeader {
            relation_name: self.relation_name.clone(),
            attr_offset: self.attr_offset,
            key_type: K::KIND,
            root_page_num: self.root_page_num,
            root_is_leaf: self.root_is_leaf,
        };
        self.with_page_mut(HEADER_PAGE_NUM, |data| header.write_to(&mut data[..]))
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Descends from the root to the leaf responsible for `key`, recording
    /// the `(page_num, child_index)` frames visited so splits can
    /// propagate back up without on-disk parent pointers.
    ///
    /// Insertion descends right at equal separators (duplicates land after
    /// existing ones); scans descend left (a duplicate run that spans
    /// leaves is entered at its first occurrence).
    fn descend(&self, key: &K, for_insert: bool) -> Result<(u32, Vec<(u32, usize)>)> {
        let mut path = Vec::new();
        if self.root_is_leaf {
            return Ok((self.root_page_num, path));
        }

        let mut current = self.root_page_num;
        loop {
            let (child, index, level) = self.with_page(current, |data| {
                let branch = BranchRef::<K>::new(data);
                let index = if for_insert {
                    branch.child_index_for_insert(key)
                } else {
                    branch.child_index_for_scan(key)
                };
                (branch.child_at(index), index, branch.level())
            })?;

            if child == NO_PAGE {
                return Err(VesperError::Internal(format!(
                    "null child pointer in branch page {}",
                    current
                )));
            }

            path.push((current, index));
            if level == 1 {
                return Ok((child, path));
            }
            current = child;
        }
    }

    /// Finds the leftmost leaf (start of the sibling chain).
    fn leftmost_leaf(&self) -> Result<u32> {
        if self.root_is_leaf {
            return Ok(self.root_page_num);
        }

        let mut current = self.root_page_num;
        loop {
            let (child, level) = self.with_page(current, |data| {
                let branch = BranchRef::<K>::new(data);
                (branch.child_at(0), branch.level())
            })?;

            if child == NO_PAGE {
                return Err(VesperError::Internal(format!(
                    "null child pointer in branch page {}",
                    current
                )));
            }
            if level == 1 {
                return Ok(child);
            }
            current = child;
        }
    }

    // ========================================================================
    // Insert engine
    // ========================================================================

    /// Inserts a `(key, rid)` entry.
    ///
    /// Splits overflowing nodes on the way back up the recorded path,
    /// growing a new root when the split reaches it. Not allowed while a
    /// scan is active: the scan's position would become undefined.
    pub fn insert(&mut self, key: K, rid: Rid) -> Result<()> {
        if self.scan.is_some() {
            return Err(VesperError::ScanActive);
        }

        let (leaf_pn, mut path) = self.descend(&key, true)?;

        let count = self.with_page(leaf_pn, |data| LeafRef::<K>::new(data).count())?;
        if count < leaf_capacity(K::SIZE) {
            return self.with_page_mut(leaf_pn, |data| {
                let mut leaf = LeafMut::<K>::new(data);
                let at = leaf.upper_bound(&key);
                leaf.insert_at(at, key, rid)
            })?;
        }

        // Leaf overflow: split, then push separators up. Page writes are
        // published leaf-first, then ascending parents, then root swap,
        // then the header update.
        let (mut sep, mut new_child) = self.split_leaf(leaf_pn, key, rid)?;
        loop {
            let Some((parent_pn, child_index)) = path.pop() else {
                return self.grow_root(sep, new_child);
            };

            let count = self.with_page(parent_pn, |data| BranchRef::<K>::new(data).count())?;
            if count < branch_capacity(K::SIZE) {
                return self.with_page_mut(parent_pn, |data| {
                    let mut branch = BranchMut::<K>::new(data);
                    branch.insert_at(child_index, sep, new_child)
                })?;
            }

            let (promoted, new_pn) = self.split_branch(parent_pn, child_index, sep, new_child)?;
            sep = promoted;
            new_child = new_pn;
        }
    }

    /// Splits a full leaf and inserts the pending entry into whichever
    /// half now owns its key range. Returns the separator (the right
    /// leaf's first key) and the new leaf's page number.
    fn split_leaf(&self, leaf_pn: u32, key: K, rid: Rid) -> Result<(K, u32)> {
        let left = self.fetch_pinned(leaf_pn)?;
        let (right_pn, right) = match self.alloc_pinned() {
            Ok(allocated) => allocated,
            Err(e) => {
                self.unpin(leaf_pn, false)?;
                return Err(e);
            }
        };

        let sep_result: Result<K> = (|| {
            let mut left_data = left.write_data();
            let mut right_data = right.write_data();
            let mut left_leaf = LeafMut::<K>::new(&mut left_data);
            let mut right_leaf = LeafMut::<K>::new(&mut right_data);
            right_leaf.init();

            let sep = left_leaf.split_into(&mut right_leaf, right_pn);

            // A key equal to the separator belongs right: the right leaf
            // heads the run of equal keys, and the new duplicate must land
            // after all existing ones.
            if key.compare(&sep) == Ordering::Less {
                let at = left_leaf.upper_bound(&key);
                left_leaf.insert_at(at, key, rid)?;
            } else {
                let at = right_leaf.upper_bound(&key);
                right_leaf.insert_at(at, key, rid)?;
            }
            Ok(sep)
        })();

        let unpin_left = self.unpin(leaf_pn, true);
        let unpin_right = self.unpin(right_pn, true);
        let sep = sep_result?;
        unpin_left?;
        unpin_right?;
        Ok((sep, right_pn))
    }

    /// Splits a full branch, pushing up its middle key, and places the
    /// pending separator into the correct half by its recorded position.
    fn split_branch(
        &self,
        branch_pn: u32,
        child_index: usize,
        key: K,
        right_child: u32,
    ) -> Result<(K, u32)> {
        let left = self.fetch_pinned(branch_pn)?;
        let (right_pn, right) = match self.alloc_pinned() {
            Ok(allocated) => allocated,
            Err(e) => {
                self.unpin(branch_pn, false)?;
                return Err(e);
            }
        };

        let promoted_result: Result<K> = (|| {
            let mut left_data = left.write_data();
            let mut right_data = right.write_data();
            let mut left_branch = BranchMut::<K>::new(&mut left_data);
            let mut right_branch = BranchMut::<K>::new(&mut right_data);

            let promoted = left_branch.split_into(&mut right_branch);
            let mid = left_branch.count();

            if child_index <= mid {
                left_branch.insert_at(child_index, key, right_child)?;
            } else {
                right_branch.insert_at(child_index - mid - 1, key, right_child)?;
            }
            Ok(promoted)
        })();

        let unpin_left = self.unpin(branch_pn, true);
        let unpin_right = self.unpin(right_pn, true);
        let promoted = promoted_result?;
        unpin_left?;
        unpin_right?;
        Ok((promoted, right_pn))
    }

    /// Installs a new root above the old one after a root split, then
    /// publishes the new root location through the header page.
    fn grow_root(&mut self, sep: K, right_child: u32) -> Result<()> {
        let new_level = if self.root_is_leaf {
            1
        } else {
            self.with_page(self.root_page_num, |data| {
                BranchRef::<K>::new(data).level()
            })? + 1
        };

        let (root_pn, frame) = self.alloc_pinned()?;
        let init_result: Result<()> = (|| {
            let mut data = frame.write_data();
            let mut root = BranchMut::<K>::new(&mut data);
            root.init(new_level);
            root.set_child(0, self.root_page_num);
            root.insert_at(0, sep, right_child)?;
            Ok(())
        })();
        let unpinned = self.unpin(root_pn, true);
        init_result?;
        unpinned?;

        self.root_page_num = root_pn;
        self.root_is_leaf = false;
        self.write_header()
    }

    // ========================================================================
    // Scan engine
    // ========================================================================

    /// Positions a range scan at its first qualifying entry.
    ///
    /// The low endpoint must use `>` or `>=` and the high endpoint `<` or
    /// `<=`; inconsistent endpoints fail with `BadScanRange`. Either
    /// endpoint may be absent for an open-ended scan. An already active
    /// scan is ended first.
    pub fn start_scan(
        &mut self,
        low: Option<(K, ScanOp)>,
        high: Option<(K, ScanOp)>,
    ) -> Result<()> {
        validate_range(&low, &high)?;

        if self.scan.is_some() {
            self.end_scan()?;
        }

        let (mut leaf_pn, mut slot) = match &low {
            Some((key, _)) => {
                let (leaf, _) = self.descend(key, false)?;
                let at = self.with_page(leaf, |data| LeafRef::<K>::new(data).lower_bound(key))?;
                (leaf, at)
            }
            None => (self.leftmost_leaf()?, 0),
        };

        // Walk forward past exclusive-low duplicates and exhausted leaves.
        loop {
            let (sibling, key_here) = self.with_page(leaf_pn, |data| {
                let leaf = LeafRef::<K>::new(data);
                let key_here = (slot < leaf.count()).then(|| leaf.key_at(slot));
                (leaf.right_sibling(), key_here)
            })?;

            match key_here {
                None => {
                    if sibling == NO_PAGE {
                        self.scan = Some(ScanCursor {
                            high,
                            pos: ScanPos::Exhausted,
                        });
                        return Ok(());
                    }
                    leaf_pn = sibling;
                    slot = 0;
                }
                Some(key) => {
                    if let Some((low_key, ScanOp::Gt)) = &low {
                        if key.compare(low_key) == Ordering::Equal {
                            slot += 1;
                            continue;
                        }
                    }
                    break;
                }
            }
        }

        // The active leaf stays pinned until the scan moves off it.
        self.fetch_pinned(leaf_pn)?;
        self.scan = Some(ScanCursor {
            high,
            pos: ScanPos::At {
                leaf: leaf_pn,
                slot,
            },
        });
        Ok(())
    }

    /// Returns the Rid of the next entry in the range.
    ///
    /// Fails with `ScanNotInitialized` before `start_scan`, and with
    /// `ScanCompleted` once the high endpoint is crossed or the leaf chain
    /// ends.
    pub fn next_match(&mut self) -> Result<Rid> {
        let cursor = self.scan.ok_or(VesperError::ScanNotInitialized)?;
        let ScanPos::At { leaf, slot } = cursor.pos else {
            return Err(VesperError::ScanCompleted);
        };

        let (key, rid, count, sibling) = self.with_page(leaf, |data| {
            let view = LeafRef::<K>::new(data);
            (
                view.key_at(slot),
                view.rid_at(slot),
                view.count(),
                view.right_sibling(),
            )
        })?;

        if let Some((high_key, high_op)) = &cursor.high {
            let ord = key.compare(high_key);
            let beyond = match high_op {
                ScanOp::Lt => ord != Ordering::Less,
                ScanOp::Lte => ord == Ordering::Greater,
                // Lower-bound operators are rejected at start_scan
                _ => false,
            };
            if beyond {
                self.unpin(leaf, false)?;
                self.scan = Some(ScanCursor {
                    high: cursor.high,
                    pos: ScanPos::Exhausted,
                });
                return Err(VesperError::ScanCompleted);
            }
        }

        if slot + 1 < count {
            self.scan = Some(ScanCursor {
                high: cursor.high,
                pos: ScanPos::At {
                    leaf,
                    slot: slot + 1,
                },
            });
        } else {
            self.unpin(leaf, false)?;
            if sibling == NO_PAGE {
                self.scan = Some(ScanCursor {
                    high: cursor.high,
                    pos: ScanPos::Exhausted,
                });
            } else {
                self.fetch_pinned(sibling)?;
                self.scan = Some(ScanCursor {
                    high: cursor.high,
                    pos: ScanPos::At {
                        leaf: sibling,
                        slot: 0,
                    },
                });
            }
        }
        Ok(rid)
    }

    /// Ends the active scan, releasing its pinned leaf.
    pub fn end_scan(&mut self) -> Result<()> {
        match self.scan.take() {
            None => Err(VesperError::ScanNotInitialized),
            Some(cursor) => {
                if let ScanPos::At { leaf, .. } = cursor.pos {
                    self.unpin(leaf, false)?;
                }
                Ok(())
            }
        }
    }

    /// Writes all of the index file's dirty pages to disk and syncs it.
    pub fn flush(&self) -> Result<()> {
        self.pool.flush_file(self.file_id, |page_id, data| {
            let mut buf = [0u8; PAGE_SIZE];
            buf.copy_from_slice(data);
            self.disk.write_page(page_id, &buf)
        })?;
        self.disk.sync_file(self.file_id)
    }
}

impl<K: IndexKey> Drop for Index<K> {
    fn drop(&mut self) {
        if self.scan.is_some() {
            let _ = self.end_scan();
        }
        let _ = self.flush();
    }
}

/// Type-erased index dispatching on the attribute type.
///
/// Keys cross this boundary as raw attribute bytes and are decoded
/// according to the key domain fixed at construction.
pub enum AnyIndex {
    /// Index over a 32-bit signed integer attribute.
    Int(Index<i32>),
    /// Index over a 64-bit double attribute.
    Double(Index<f64>),
    /// Index over a fixed-width string attribute.
    Str(Index<StrKey>),
}

fn decode_bound<K: IndexKey>(raw: Option<&[u8]>, op: ScanOp) -> Result<Option<(K, ScanOp)>> {
    raw.map(|bytes| K::decode(bytes).map(|key| (key, op)))
        .transpose()
}

impl AnyIndex {
    /// Opens or builds the index for `(relation, attr_offset, key_type)`.
    pub fn construct(
        disk: Arc<DiskManager>,
        pool: Arc<BufferPool>,
        relation_name: &str,
        attr_offset: u32,
        key_type: KeyType,
    ) -> Result<Self> {
        match key_type {
            KeyType::Int => {
                Index::<i32>::construct(disk, pool, relation_name, attr_offset).map(AnyIndex::Int)
            }
            KeyType::Double => Index::<f64>::construct(disk, pool, relation_name, attr_offset)
                .map(AnyIndex::Double),
            KeyType::Str => Index::<StrKey>::construct(disk, pool, relation_name, attr_offset)
                .map(AnyIndex::Str),
        }
    }

    /// Returns the index file name.
    pub fn index_name(&self) -> &str {
        match self {
            AnyIndex::Int(index) => index.index_name(),
            AnyIndex::Double(index) => index.index_name(),
            AnyIndex::Str(index) => index.index_name(),
        }
    }

    /// Returns the attribute type this index was built over.
    pub fn key_type(&self) -> KeyType {
        match self {
            AnyIndex::Int(_) => KeyType::Int,
            AnyIndex::Double(_) => KeyType::Double,
            AnyIndex::Str(_) => KeyType::Str,
        }
    }

    /// Inserts an entry; `key` holds the raw attribute bytes.
    pub fn insert(&mut self, key: &[u8], rid: Rid) -> Result<()> {
        match self {
            AnyIndex::Int(index) => index.insert(i32::decode(key)?, rid),
            AnyIndex::Double(index) => index.insert(f64::decode(key)?, rid),
            AnyIndex::Str(index) => index.insert(StrKey::decode(key)?, rid),
        }
    }

    /// Starts a range scan; endpoint keys hold raw attribute bytes.
    pub fn start_scan(
        &mut self,
        low: Option<&[u8]>,
        low_op: ScanOp,
        high: Option<&[u8]>,
        high_op: ScanOp,
    ) -> Result<()> {
        match self {
            AnyIndex::Int(index) => {
                index.start_scan(decode_bound(low, low_op)?, decode_bound(high, high_op)?)
            }
            AnyIndex::Double(index) => {
                index.start_scan(decode_bound(low, low_op)?, decode_bound(high, high_op)?)
            }
            AnyIndex::Str(index) => {
                index.start_scan(decode_bound(low, low_op)?, decode_bound(high, high_op)?)
            }
        }
    }

    /// Returns the Rid of the next entry in the range.
    pub fn next_match(&mut self) -> Result<Rid> {
        match self {
            AnyIndex::Int(index) => index.next_match(),
            AnyIndex::Double(index) => index.next_match(),
            AnyIndex::Str(index) => index.next_match(),
        }
    }

    /// Ends the active scan.
    pub fn end_scan(&mut self) -> Result<()> {
        match self {
            AnyIndex::Int(index) => index.end_scan(),
            AnyIndex::Double(index) => index.end_scan(),
            AnyIndex::Str(index) => index.end_scan(),
        }
    }
}
