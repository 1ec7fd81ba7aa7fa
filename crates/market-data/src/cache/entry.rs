use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::models::TickerSnapshot;

/// A stored snapshot and the monotonic instant it was stored.
#[derive(Clone, Debug)]
pub(crate) struct CacheEntry {
    snapshot: Arc<TickerSnapshot>,
    stored_at: Instant,
}

impl CacheEntry {
    pub(crate) fn new(snapshot: Arc<TickerSnapshot>, stored_at: Instant) -> Self {
        Self {
            snapshot,
            stored_at,
        }
    }

    pub(crate) fn snapshot(&self) -> Arc<TickerSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub(crate) fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    /// `age < ttl`; an entry exactly `ttl` old is stale.
    pub(crate) fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}
