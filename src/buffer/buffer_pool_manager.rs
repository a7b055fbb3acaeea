use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use log::{debug, info, trace, warn};
use parking_lot::Mutex;

use crate::common::{BerthError, BufferPoolConfig, FrameId, PageId, Result, INVALID_PAGE_ID};
use crate::storage::disk::DiskManager;

use super::{LruReplacer, Page, ReadPageGuard, ReleaseCallback, WritePageGuard};

/// Bookkeeping guarded by the pool latch
struct PoolInner {
    /// Page table: maps resident page IDs to frame IDs
    page_table: HashMap<PageId, FrameId>,
    /// Free list: frames that hold no page
    free_list: VecDeque<FrameId>,
    /// Unpinned resident frames, in eviction order
    replacer: LruReplacer,
}

/// Internal state that can be shared across threads and page guards
struct BufferPoolState {
    /// The buffer pool frames
    frames: Vec<Arc<Page>>,
    /// Coarse latch over the page table, free list, replacer and every
    /// page's pin count and dirty flag
    inner: Mutex<PoolInner>,
    disk_manager: Arc<DiskManager>,
}

/// BufferPoolManager is responsible for fetching database pages from disk
/// and storing them in memory. It manages a fixed number of frames and
/// evicts the least recently unpinned page when it runs out of free ones.
///
/// Every operation runs under one pool latch, disk I/O included. A frame is
/// always in exactly one of three states: on the free list, pinned, or
/// tracked by the replacer.
pub struct BufferPoolManager {
    /// Number of frames in the buffer pool
    pool_size: usize,
    /// Shared state
    state: Arc<BufferPoolState>,
}

impl BufferPoolManager {
    /// Creates a new BufferPoolManager with `pool_size` frames.
    pub fn new(pool_size: usize, disk_manager: Arc<DiskManager>) -> Self {
        let mut frames = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);

        for i in 0..pool_size {
            let frame_id = FrameId::new(i as u32);
            frames.push(Arc::new(Page::new(frame_id)));
            free_list.push_back(frame_id);
        }

        info!(
            "buffer pool created with {} frames over {}",
            pool_size,
            disk_manager.get_db_path()
        );

        let state = Arc::new(BufferPoolState {
            frames,
            inner: Mutex::new(PoolInner {
                page_table: HashMap::with_capacity(pool_size),
                free_list,
                replacer: LruReplacer::new(pool_size),
            }),
            disk_manager,
        });

        Self { pool_size, state }
    }

    /// Creates a new BufferPoolManager from a config.
    pub fn with_config(config: BufferPoolConfig, disk_manager: Arc<DiskManager>) -> Self {
        Self::new(config.pool_size, disk_manager)
    }

    /// Fetches a page and pins it.
    ///
    /// A resident page is returned without disk I/O. Otherwise a frame is
    /// taken from the free list or by evicting the least recently unpinned
    /// page, and the page is read from disk. Fails with `BufferPoolFull`
    /// when every frame is pinned, and with `InvalidPageId` for a page the
    /// disk manager has not allocated.
    ///
    /// The caller must call `unpin_page` once per successful fetch.
    pub fn fetch_page(&self, page_id: PageId) -> Result<Arc<Page>> {
        if page_id == INVALID_PAGE_ID {
            return Err(BerthError::InvalidPageId(page_id));
        }
        self.state.fetch_page(page_id)
    }

    /// Allocates a new page on disk and pins it in the buffer pool.
    ///
    /// The page starts zeroed and dirty. If no frame can be obtained the
    /// allocated page ID is handed back to the disk manager.
    pub fn new_page(&self) -> Result<(PageId, Arc<Page>)> {
        self.state.new_page()
    }

    /// Releases one pin on a page, marking it dirty if `is_dirty` is set.
    ///
    /// Returns false if the page is not resident or is not pinned. The dirty
    /// flag is only ever raised here; flushing clears it.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        match self.state.unpin_page(page_id, is_dirty) {
            Ok(()) => true,
            Err(err) => {
                debug!("unpin of {} rejected: {}", page_id, err);
                false
            }
        }
    }

    /// Writes a resident page to disk, whether or not it is dirty, and
    /// clears its dirty flag. Returns false if the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        if page_id == INVALID_PAGE_ID {
            return Err(BerthError::InvalidPageId(page_id));
        }
        self.state.flush_page(page_id)
    }

    /// Writes every resident page to disk and syncs the database file.
    pub fn flush_all_pages(&self) -> Result<()> {
        self.state.flush_all_pages()
    }

    /// Deletes a page from the buffer pool and deallocates it on disk.
    ///
    /// Returns true if the page is gone afterwards (including when it was
    /// never resident) and false if it is still pinned, in which case
    /// nothing changes.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        if page_id == INVALID_PAGE_ID {
            return Err(BerthError::InvalidPageId(page_id));
        }
        match self.state.delete_page(page_id) {
            Ok(()) => Ok(true),
            Err(err @ BerthError::PageStillPinned(_)) => {
                debug!("delete rejected: {}", err);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Fetches a page for read access. The pin is released when the guard
    /// is dropped.
    pub fn read_page(&self, page_id: PageId) -> Result<ReadPageGuard> {
        let page = self.fetch_page(page_id)?;
        Ok(ReadPageGuard::new(page, self.release_callback()))
    }

    /// Fetches a page for write access. The pin is released when the guard
    /// is dropped, marking the page dirty if it was written through.
    pub fn write_page(&self, page_id: PageId) -> Result<WritePageGuard> {
        let page = self.fetch_page(page_id)?;
        Ok(WritePageGuard::new(page, self.release_callback()))
    }

    /// Returns the pin count for a page, or None if it is not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let inner = self.state.inner.lock();
        inner
            .page_table
            .get(&page_id)
            .map(|&frame_id| self.state.frames[frame_id.as_usize()].pin_count())
    }

    /// Returns whether a page is resident in the buffer pool.
    pub fn contains_page(&self, page_id: PageId) -> bool {
        self.state.inner.lock().page_table.contains_key(&page_id)
    }

    /// Returns the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Returns the number of free frames.
    pub fn free_frame_count(&self) -> usize {
        self.state.inner.lock().free_list.len()
    }

    /// Returns the number of unpinned resident frames.
    pub fn evictable_frame_count(&self) -> usize {
        self.state.inner.lock().replacer.size()
    }

    /// Returns the disk manager backing this pool.
    pub fn disk_manager(&self) -> &Arc<DiskManager> {
        &self.state.disk_manager
    }

    fn release_callback(&self) -> ReleaseCallback {
        let state = Arc::clone(&self.state);
        Box::new(move |page_id, is_dirty| {
            if let Err(err) = state.unpin_page(page_id, is_dirty) {
                warn!("page guard release failed: {}", err);
            }
        })
    }
}

impl BufferPoolState {
    fn page(&self, frame_id: FrameId) -> &Arc<Page> {
        &self.frames[frame_id.as_usize()]
    }

    fn fetch_page(&self, page_id: PageId) -> Result<Arc<Page>> {
        let mut inner = self.inner.lock();

        if let Some(&frame_id) = inner.page_table.get(&page_id) {
            let page = self.page(frame_id);
            page.pin();
            inner.replacer.pin(frame_id);
            trace!("buffer hit for {} in {}", page_id, frame_id);
            return Ok(Arc::clone(page));
        }

        // Only allocated pages may become resident, otherwise a later
        // allocation of the same ID would bind it to a second frame
        if !self.disk_manager.is_allocated(page_id) {
            return Err(BerthError::InvalidPageId(page_id));
        }

        let frame_id = self.acquire_frame(&mut inner)?;
        let page = self.page(frame_id);

        let read = {
            let mut data = page.data_mut();
            self.disk_manager.read_page(page_id, &mut data[..])
        };
        if let Err(err) = read {
            page.reset();
            inner.free_list.push_back(frame_id);
            return Err(err);
        }

        page.bind(page_id, false);
        inner.page_table.insert(page_id, frame_id);
        debug!("buffer miss for {}, loaded into {}", page_id, frame_id);

        Ok(Arc::clone(page))
    }

    fn new_page(&self) -> Result<(PageId, Arc<Page>)> {
        let mut inner = self.inner.lock();

        let page_id = self.disk_manager.allocate_page()?;
        if inner.page_table.contains_key(&page_id) {
            // Deallocated on disk behind the pool's back while resident
            warn!("allocated {} is already resident", page_id);
            return Err(BerthError::InvalidPageId(page_id));
        }

        let frame_id = match self.acquire_frame(&mut inner) {
            Ok(frame_id) => frame_id,
            Err(err) => {
                if let Err(dealloc_err) = self.disk_manager.deallocate_page(page_id) {
                    warn!("failed to return {} to disk: {}", page_id, dealloc_err);
                }
                return Err(err);
            }
        };

        let page = self.page(frame_id);
        page.bind(page_id, true);
        inner.page_table.insert(page_id, frame_id);
        debug!("created {} in {}", page_id, frame_id);

        Ok((page_id, Arc::clone(page)))
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<()> {
        let mut inner = self.inner.lock();

        let frame_id = *inner
            .page_table
            .get(&page_id)
            .ok_or(BerthError::PageNotFound(page_id))?;
        let page = self.page(frame_id);

        let remaining = page.unpin().ok_or(BerthError::PageNotPinned(page_id))?;
        if is_dirty {
            page.set_dirty(true);
        }
        if remaining == 0 {
            inner.replacer.unpin(frame_id);
        }

        Ok(())
    }

    fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let inner = self.inner.lock();

        match inner.page_table.get(&page_id) {
            Some(&frame_id) => {
                self.write_back(self.page(frame_id))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn flush_all_pages(&self) -> Result<()> {
        let inner = self.inner.lock();

        for &frame_id in inner.page_table.values() {
            self.write_back(self.page(frame_id))?;
        }
        self.disk_manager.sync()?;

        info!("flushed {} resident pages", inner.page_table.len());
        Ok(())
    }

    fn delete_page(&self, page_id: PageId) -> Result<()> {
        let mut inner = self.inner.lock();

        let Some(&frame_id) = inner.page_table.get(&page_id) else {
            return Ok(());
        };
        let page = self.page(frame_id);
        if page.pin_count() > 0 {
            return Err(BerthError::PageStillPinned(page_id));
        }

        // Deallocate first so a failure leaves the pool untouched
        self.disk_manager.deallocate_page(page_id)?;

        inner.page_table.remove(&page_id);
        inner.replacer.remove(frame_id);
        page.reset();
        inner.free_list.push_back(frame_id);
        debug!("deleted {} from {}", page_id, frame_id);

        Ok(())
    }

    /// Writes the page content to disk and clears the dirty flag.
    fn write_back(&self, page: &Page) -> Result<()> {
        {
            let data = page.data();
            self.disk_manager.write_page(page.page_id(), &data[..])?;
        }
        page.set_dirty(false);
        trace!("wrote {} from {}", page.page_id(), page.frame_id());
        Ok(())
    }

    /// Gets a zeroed, unbound frame, either from the free list or by
    /// evicting a page. A dirty victim is written back before reuse.
    fn acquire_frame(&self, inner: &mut PoolInner) -> Result<FrameId> {
        if let Some(frame_id) = inner.free_list.pop_front() {
            self.page(frame_id).reset();
            return Ok(frame_id);
        }

        let Some(frame_id) = inner.replacer.victim() else {
            warn!(
                "buffer pool exhausted: all {} frames pinned",
                inner.replacer.capacity()
            );
            return Err(BerthError::BufferPoolFull);
        };

        let page = self.page(frame_id);
        let victim_page_id = page.page_id();

        if page.is_dirty() {
            if let Err(err) = self.write_back(page) {
                // The victim stays resident and evictable
                inner.replacer.unpin(frame_id);
                return Err(err);
            }
            debug!("wrote back dirty {} before eviction", victim_page_id);
        }

        if inner.page_table.get(&victim_page_id) == Some(&frame_id) {
            inner.page_table.remove(&victim_page_id);
        }
        page.reset();
        debug!("evicted {} from {}", victim_page_id, frame_id);

        Ok(frame_id)
    }
}
