//! Ticker cache with request coalescing.
//!
//! [`TickerCache`] keeps the most recent snapshot per symbol for a fixed TTL
//! and guarantees that concurrent misses for one symbol share a single
//! upstream fetch.

mod entry;
mod stats;
mod ticker_cache;

pub use stats::CacheStats;
pub use ticker_cache::TickerCache;
