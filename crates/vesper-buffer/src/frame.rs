//! Buffer frame management.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use vesper_common::page::{PageId, PAGE_SIZE};
use vesper_common::{Result, VesperError};

/// Sentinel value indicating no page is loaded in the frame.
const NO_PAGE: u64 = u64::MAX;

/// Unique identifier for a frame in the buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u32);

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame:{}", self.0)
    }
}

/// A frame in the buffer pool holding a single page.
///
/// The frame owns the page bytes plus the bookkeeping the pool needs:
/// pin count, dirty flag, and the reference bit consumed by the clock
/// replacement algorithm. A page's bytes stay resident for as long as its
/// pin count is non-zero.
pub struct Frame {
    /// Frame identifier.
    frame_id: FrameId,
    /// The page currently held (packed PageId, NO_PAGE when empty).
    page_id: AtomicU64,
    /// Page data buffer.
    data: RwLock<Box<[u8; PAGE_SIZE]>>,
    /// Number of users currently holding this page.
    pin_count: AtomicU32,
    /// Whether the page bytes were modified since the last flush.
    dirty: AtomicBool,
    /// Reference bit for clock replacement.
    referenced: AtomicBool,
}

impl Frame {
    /// Creates a new empty frame.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            page_id: AtomicU64::new(NO_PAGE),
            data: RwLock::new(Box::new([0u8; PAGE_SIZE])),
            pin_count: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
            referenced: AtomicBool::new(false),
        }
    }

    /// Returns the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the page currently held by this frame, if any.
    #[inline]
    pub fn page_id(&self) -> Option<PageId> {
        let packed = self.page_id.load(Ordering::Acquire);
        if packed == NO_PAGE {
            None
        } else {
            Some(PageId::from_u64(packed))
        }
    }

    /// Associates the frame with a page (or clears it with None).
    #[inline]
    pub fn set_page_id(&self, page_id: Option<PageId>) {
        let packed = page_id.map(|p| p.as_u64()).unwrap_or(NO_PAGE);
        self.page_id.store(packed, Ordering::Release);
    }

    /// Returns the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Increments the pin count and sets the reference bit.
    /// Returns the new pin count.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.referenced.store(true, Ordering::Relaxed);
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count.
    ///
    /// Unpinning a frame whose pin count is already zero is a caller
    /// contract violation and reported as `PageNotPinned`.
    #[inline]
    pub fn unpin(&self) -> Result<u32> {
        let prev = self.pin_count.load(Ordering::Acquire);
        if prev == 0 {
            return Err(VesperError::PageNotPinned {
                page_id: self.page_id().unwrap_or(PageId::new(u32::MAX, u32::MAX)),
            });
        }
        Ok(self.pin_count.fetch_sub(1, Ordering::AcqRel) - 1)
    }

    /// Returns true if this frame is pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Returns true if this frame is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Sets or clears the dirty flag.
    #[inline]
    pub fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::Release);
    }

    /// Returns the reference bit value.
    #[inline]
    pub fn referenced(&self) -> bool {
        self.referenced.load(Ordering::Relaxed)
    }

    /// Sets the reference bit.
    #[inline]
    pub fn set_referenced(&self, value: bool) {
        self.referenced.store(value, Ordering::Relaxed);
    }

    /// Returns true if no page is loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.page_id.load(Ordering::Acquire) == NO_PAGE
    }

    /// Reads the page data.
    #[inline]
    pub fn read_data(&self) -> parking_lot::RwLockReadGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.data.read()
    }

    /// Writes to the page data.
    #[inline]
    pub fn write_data(&self) -> parking_lot::RwLockWriteGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.data.write()
    }

    /// Copies bytes into the frame, truncating at the page size.
    #[inline]
    pub fn copy_from(&self, src: &[u8]) {
        let mut data = self.data.write();
        let len = src.len().min(PAGE_SIZE);
        data[..len].copy_from_slice(&src[..len]);
    }

    /// Resets the frame to its empty state.
    pub fn reset(&self) {
        self.page_id.store(NO_PAGE, Ordering::Release);
        self.pin_count.store(0, Ordering::Release);
        self.dirty.store(false, Ordering::Release);
        self.referenced.store(false, Ordering::Relaxed);
        self.data.write().fill(0);
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("frame_id", &self.frame_id)
            .field("page_id", &self.page_id())
            .field("pin_count", &self.pin_count())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_new() {
        let frame = Frame::new(FrameId(0));
        assert_eq!(frame.frame_id(), FrameId(0));
        assert!(frame.page_id().is_none());
        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_dirty());
        assert!(frame.is_empty());
    }

    #[test]
    fn test_frame_pin_unpin() {
        let frame = Frame::new(FrameId(0));
        frame.set_page_id(Some(PageId::new(0, 1)));

        assert_eq!(frame.pin(), 1);
        assert_eq!(frame.pin(), 2);
        assert!(frame.is_pinned());

        assert_eq!(frame.unpin().unwrap(), 1);
        assert_eq!(frame.unpin().unwrap(), 0);
        assert!(!frame.is_pinned());
    }

    #[test]
    fn test_frame_unpin_underflow_is_error() {
        let frame = Frame::new(FrameId(0));
        frame.set_page_id(Some(PageId::new(2, 9)));

        let err = frame.unpin().unwrap_err();
        assert!(matches!(err, VesperError::PageNotPinned { page_id } if page_id == PageId::new(2, 9)));
        assert_eq!(frame.pin_count(), 0);
    }

    #[test]
    fn test_frame_pin_sets_reference_bit() {
        let frame = Frame::new(FrameId(0));
        assert!(!frame.referenced());
        frame.pin();
        assert!(frame.referenced());
    }

    #[test]
    fn test_frame_dirty_flag() {
        let frame = Frame::new(FrameId(0));
        frame.set_dirty(true);
        assert!(frame.is_dirty());
        frame.set_dirty(false);
        assert!(!frame.is_dirty());
    }

    #[test]
    fn test_frame_data_access() {
        let frame = Frame::new(FrameId(0));
        {
            let mut data = frame.write_data();
            data[0] = 0xAB;
            data[PAGE_SIZE - 1] = 0xCD;
        }
        let data = frame.read_data();
        assert_eq!(data[0], 0xAB);
        assert_eq!(data[PAGE_SIZE - 1], 0xCD);
    }

    #[test]
    fn test_frame_copy_from() {
        let frame = Frame::new(FrameId(0));
        frame.copy_from(&[1, 2, 3]);
        let data = frame.read_data();
        assert_eq!(&data[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_frame_reset() {
        let frame = Frame::new(FrameId(0));
        frame.set_page_id(Some(PageId::new(1, 1)));
        frame.pin();
        frame.set_dirty(true);
        frame.write_data()[0] = 0xFF;

        frame.reset();

        assert!(frame.is_empty());
        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_dirty());
        assert_eq!(frame.read_data()[0], 0);
    }
}
