use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageId, INVALID_PAGE_ID, PAGE_SIZE};

/// Raw page content.
pub type PageData = Box<[u8; PAGE_SIZE]>;

/// A slot of the buffer pool: the page content plus its metadata.
///
/// Slots are created once with the pool and reused for its whole lifetime;
/// only the binding to a page ID changes. Metadata is stored in atomics so
/// the accessors are lock-free snapshots, but it is only mutated by the
/// buffer pool while it holds its own lock.
pub struct Page {
    /// The frame ID (index in the buffer pool)
    frame_id: FrameId,
    /// The page ID stored in this frame (INVALID_PAGE_ID if free)
    page_id: AtomicU32,
    /// Number of active holders of this page
    pin_count: AtomicU32,
    /// Whether the content differs from the on-disk copy
    is_dirty: AtomicBool,
    /// Latch over the page content
    data: RwLock<PageData>,
}

impl Page {
    /// Creates an unbound page slot for the given frame.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            page_id: AtomicU32::new(INVALID_PAGE_ID.as_u32()),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
            data: RwLock::new(Box::new([0u8; PAGE_SIZE])),
        }
    }

    /// Returns the frame ID of the slot.
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the page ID bound to this slot.
    pub fn page_id(&self) -> PageId {
        PageId::new(self.page_id.load(Ordering::Acquire))
    }

    /// Returns the current pin count.
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Returns whether the page is dirty.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Acquire)
    }

    /// Locks the page content for reading.
    pub fn data(&self) -> RwLockReadGuard<'_, PageData> {
        self.data.read()
    }

    /// Locks the page content for writing. Does not mark the page dirty;
    /// report modifications through `unpin_page`.
    pub fn data_mut(&self) -> RwLockWriteGuard<'_, PageData> {
        self.data.write()
    }

    pub(crate) fn set_page_id(&self, page_id: PageId) {
        self.page_id.store(page_id.as_u32(), Ordering::Release);
    }

    /// Increments the pin count and returns the new value.
    pub(crate) fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value.
    /// Returns None if the pin count was already 0.
    pub(crate) fn unpin(&self) -> Option<u32> {
        self.pin_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(1)
            })
            .ok()
            .map(|previous| previous - 1)
    }

    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.is_dirty.store(dirty, Ordering::Release);
    }

    /// Binds the slot to `page_id` with a single pin.
    pub(crate) fn bind(&self, page_id: PageId, dirty: bool) {
        self.set_page_id(page_id);
        self.pin_count.store(1, Ordering::Release);
        self.set_dirty(dirty);
    }

    /// Resets the slot to its unbound state and zeroes its content.
    pub(crate) fn reset(&self) {
        self.set_page_id(INVALID_PAGE_ID);
        self.pin_count.store(0, Ordering::Release);
        self.set_dirty(false);
        self.data.write().fill(0);
    }
}
