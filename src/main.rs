use std::sync::Arc;

use berth::buffer::BufferPoolManager;
use berth::common::BufferPoolConfig;
use berth::storage::disk::DiskManager;

fn main() -> berth::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("berth=info"))
        .init();

    println!("Berth - a buffer pool manager");
    println!("=============================\n");

    let db_path = "demo.db";

    let disk_manager = Arc::new(DiskManager::new(db_path)?);
    println!("Created disk manager for: {}", db_path);

    let config = BufferPoolConfig::new(3);
    let bpm = BufferPoolManager::with_config(config, Arc::clone(&disk_manager));
    println!("Created buffer pool manager with {} frames\n", bpm.pool_size());

    // Create more pages than the pool holds so some get evicted
    let mut page_ids = Vec::new();
    for i in 0..5u8 {
        let (page_id, page) = bpm.new_page()?;
        let message = format!("page number {}", i);
        page.data_mut()[..message.len()].copy_from_slice(message.as_bytes());
        bpm.unpin_page(page_id, true);
        println!("Wrote {:?} to {}", message, page_id);
        page_ids.push(page_id);
    }

    println!(
        "\nResident pages: {}, disk writes so far: {}",
        page_ids.iter().filter(|&&pid| bpm.contains_page(pid)).count(),
        disk_manager.get_num_writes()
    );

    // Read everything back; evicted pages come in from disk
    for &page_id in &page_ids {
        let guard = bpm.read_page(page_id)?;
        let data = guard.data();
        let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        println!("Read {} -> {:?}", page_id, String::from_utf8_lossy(&data[..end]));
    }

    bpm.flush_all_pages()?;
    println!(
        "\nFlushed all pages (reads: {}, writes: {})",
        disk_manager.get_num_reads(),
        disk_manager.get_num_writes()
    );

    std::fs::remove_file(db_path).ok();
    println!("\nDemo completed successfully!");
    Ok(())
}
