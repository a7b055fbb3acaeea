//! Berth - a buffer pool manager for disk-oriented storage engines
//!
//! This crate mediates every access between fixed-size pages on disk and a
//! bounded pool of in-memory frames, deciding which resident pages to evict
//! when the pool is full.
//!
//! # Architecture
//!
//! - **Storage** (`storage`): synchronous page I/O
//!   - `DiskManager`: reads and writes pages of a single database file and
//!     hands out page IDs
//!
//! - **Buffer Pool** (`buffer`): memory management for database pages
//!   - `BufferPoolManager`: fetch / create / unpin / flush / delete
//!   - `LruReplacer`: evicts the least recently unpinned frame
//!   - `Page`: per-frame content and metadata
//!   - `ReadPageGuard`/`WritePageGuard`: RAII pins that unpin on drop
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use berth::buffer::BufferPoolManager;
//! use berth::storage::disk::DiskManager;
//!
//! let disk_manager = Arc::new(DiskManager::new("test.db").unwrap());
//! let bpm = BufferPoolManager::new(100, disk_manager);
//!
//! // Create a page; it comes back pinned
//! let (page_id, page) = bpm.new_page().unwrap();
//! page.data_mut()[..5].copy_from_slice(b"hello");
//! bpm.unpin_page(page_id, true);
//!
//! // Or let a guard handle the pin
//! {
//!     let guard = bpm.read_page(page_id).unwrap();
//!     assert_eq!(&guard.data()[..5], b"hello");
//! }
//!
//! bpm.flush_all_pages().unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

// Re-export commonly used types at the crate root
pub use common::{BerthError, FrameId, PageId, Result};
