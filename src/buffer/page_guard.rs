use std::sync::Arc;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;

use super::{Page, PageData};

/// Callback that unpins a page when its guard goes away
pub(crate) type ReleaseCallback = Box<dyn FnOnce(PageId, bool) + Send + Sync>;

/// Holds one pin on a page and gives it back exactly once
struct PinnedPage {
    page_id: PageId,
    page: Arc<Page>,
    release_callback: Option<ReleaseCallback>,
    is_dirty: bool,
}

impl PinnedPage {
    fn new(page: Arc<Page>, release_callback: ReleaseCallback) -> Self {
        Self {
            page_id: page.page_id(),
            page,
            release_callback: Some(release_callback),
            is_dirty: false,
        }
    }

    fn release(&mut self) {
        if let Some(callback) = self.release_callback.take() {
            callback(self.page_id, self.is_dirty);
        }
    }
}

/// RAII guard for read-only access to a pinned page.
/// Unpins the page (clean) when dropped.
///
/// `data()` takes the page latch only for the lifetime of the returned
/// lock guard. Drop it before calling back into the buffer pool.
pub struct ReadPageGuard {
    inner: PinnedPage,
}

impl ReadPageGuard {
    pub(crate) fn new(page: Arc<Page>, release_callback: ReleaseCallback) -> Self {
        Self {
            inner: PinnedPage::new(page, release_callback),
        }
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.inner.page_id
    }

    /// Returns the underlying page.
    pub fn page(&self) -> &Page {
        &self.inner.page
    }

    /// Locks the page content for reading.
    pub fn data(&self) -> RwLockReadGuard<'_, PageData> {
        self.inner.page.data()
    }
}

impl Drop for ReadPageGuard {
    fn drop(&mut self) {
        self.inner.release();
    }
}

/// RAII guard for read-write access to a pinned page.
/// Unpins the page when dropped, reporting it dirty if `data_mut` was called.
pub struct WritePageGuard {
    inner: PinnedPage,
}

impl WritePageGuard {
    pub(crate) fn new(page: Arc<Page>, release_callback: ReleaseCallback) -> Self {
        Self {
            inner: PinnedPage::new(page, release_callback),
        }
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.inner.page_id
    }

    /// Returns the underlying page.
    pub fn page(&self) -> &Page {
        &self.inner.page
    }

    /// Locks the page content for reading.
    pub fn data(&self) -> RwLockReadGuard<'_, PageData> {
        self.inner.page.data()
    }

    /// Locks the page content for writing and marks the guard dirty.
    pub fn data_mut(&mut self) -> RwLockWriteGuard<'_, PageData> {
        self.inner.is_dirty = true;
        self.inner.page.data_mut()
    }

    /// Returns whether this guard will report the page dirty.
    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty
    }
}

impl Drop for WritePageGuard {
    fn drop(&mut self) {
        self.inner.release();
    }
}
