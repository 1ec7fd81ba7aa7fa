use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Running counters, updated without taking the cache lock.
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    failures: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entries: usize, in_flight: usize) -> CacheStats {
        CacheStats {
            entries,
            in_flight,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the ticker cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Stored snapshots, fresh or stale
    pub entries: usize,
    /// Upstream fetches currently outstanding
    pub in_flight: usize,
    /// Lookups served from a fresh entry
    pub hits: u64,
    /// Lookups that started an upstream fetch
    pub misses: u64,
    /// Lookups that joined an outstanding fetch
    pub coalesced: u64,
    /// Upstream fetches that ended in an error
    pub failures: u64,
}
