mod buffer_pool_manager;
mod lru_replacer;
mod page;
mod page_guard;

pub use buffer_pool_manager::*;
pub use lru_replacer::*;
pub use page::*;
pub use page_guard::*;
