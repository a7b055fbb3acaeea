//! Integration tests for the disk manager

use std::sync::Arc;
use std::thread;

use berth::common::{PageId, PAGE_SIZE};
use berth::storage::disk::DiskManager;
use tempfile::NamedTempFile;

#[test]
fn test_disk_manager_create_file() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = DiskManager::new(temp_file.path()).unwrap();

    assert_eq!(dm.get_num_pages(), 0);
    assert_eq!(dm.get_num_reads(), 0);
    assert_eq!(dm.get_num_writes(), 0);
    assert_eq!(dm.get_db_path(), temp_file.path().to_string_lossy());
}

#[test]
fn test_disk_manager_allocate_pages() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = DiskManager::new(temp_file.path()).unwrap();

    for i in 0..10 {
        assert_eq!(dm.allocate_page().unwrap(), PageId::new(i));
    }

    assert_eq!(dm.get_num_pages(), 10);
    assert_eq!(
        std::fs::metadata(temp_file.path()).unwrap().len(),
        10 * PAGE_SIZE as u64
    );
}

#[test]
fn test_disk_manager_read_write_page() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = DiskManager::new(temp_file.path()).unwrap();

    let page_id = dm.allocate_page().unwrap();

    let mut write_data = [0u8; PAGE_SIZE];
    for (i, byte) in write_data.iter_mut().enumerate() {
        *byte = (i % 256) as u8;
    }
    dm.write_page(page_id, &write_data).unwrap();

    let mut read_data = [0u8; PAGE_SIZE];
    dm.read_page(page_id, &mut read_data).unwrap();

    assert_eq!(read_data, write_data);
}

#[test]
fn test_disk_manager_pages_do_not_overlap() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = DiskManager::new(temp_file.path()).unwrap();

    let pages: Vec<_> = (0..4).map(|_| dm.allocate_page().unwrap()).collect();
    for &pid in &pages {
        dm.write_page(pid, &[pid.as_u32() as u8 + 1; PAGE_SIZE]).unwrap();
    }

    for &pid in &pages {
        let mut data = [0u8; PAGE_SIZE];
        dm.read_page(pid, &mut data).unwrap();
        assert!(data.iter().all(|&b| b == pid.as_u32() as u8 + 1));
    }
}

#[test]
fn test_disk_manager_concurrent_writes() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = Arc::new(DiskManager::new(temp_file.path()).unwrap());

    let handles: Vec<_> = (0..4u8)
        .map(|t| {
            let dm = Arc::clone(&dm);
            thread::spawn(move || {
                let mut ids = Vec::new();
                for _ in 0..8 {
                    let pid = dm.allocate_page().unwrap();
                    dm.write_page(pid, &[t; PAGE_SIZE]).unwrap();
                    ids.push(pid);
                }
                (t, ids)
            })
        })
        .collect();

    let mut all_ids = Vec::new();
    for handle in handles {
        let (t, ids) = handle.join().unwrap();
        for &pid in &ids {
            let mut data = [0u8; PAGE_SIZE];
            dm.read_page(pid, &mut data).unwrap();
            assert!(data.iter().all(|&b| b == t));
        }
        all_ids.extend(ids);
    }

    all_ids.sort();
    all_ids.dedup();
    assert_eq!(all_ids.len(), 32);
    assert_eq!(dm.get_num_pages(), 32);
}
