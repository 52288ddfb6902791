pub mod cache;
pub mod sweeper;

pub use cache::{CacheEntry, CacheStats, ResponseCache, DEFAULT_TTL};
pub use sweeper::CacheSweeper;
