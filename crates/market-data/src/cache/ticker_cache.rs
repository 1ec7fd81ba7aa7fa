//! TTL-bounded ticker store with per-symbol fetch coalescing.
//!
//! Both maps (stored entries and in-flight fetches) live behind one mutex.
//! The mutex is only held for map operations; the upstream fetch runs on
//! its own task, outside the lock, and every caller waits on a watch
//! channel registered under that same lock.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::{MarketDataError, Result};
use crate::models::{Symbol, TickerSnapshot};

use super::entry::CacheEntry;
use super::stats::{CacheCounters, CacheStats};

const CACHE_SOURCE: &str = "TICKER_CACHE";

/// Result of one upstream fetch, shared by the leader and all joiners.
type FetchOutcome = Result<Arc<TickerSnapshot>>;

/// Outstanding fetch for one symbol; holds `None` until resolved.
type InFlightFetch = watch::Receiver<Option<FetchOutcome>>;

#[derive(Default)]
struct CacheState {
    entries: HashMap<Symbol, CacheEntry>,
    in_flight: HashMap<Symbol, InFlightFetch>,
}

enum Lookup {
    Hit(Arc<TickerSnapshot>),
    Join(InFlightFetch),
    Lead(watch::Sender<Option<FetchOutcome>>, InFlightFetch),
}

/// Process-wide ticker cache.
///
/// Created once at startup and shared by handle. There is no global
/// instance; state lives exactly as long as the owning `Arc`.
pub struct TickerCache {
    state: Arc<Mutex<CacheState>>,
    counters: Arc<CacheCounters>,
}

impl TickerCache {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            counters: Arc::new(CacheCounters::default()),
        }
    }

    /// Return the freshest known ticker for `symbol`.
    ///
    /// - A fresh entry (`age < ttl`) is returned without calling `fetch`.
    /// - Otherwise, if a fetch for `symbol` is already outstanding, the caller
    ///   waits for it and receives its outcome.
    /// - Otherwise the caller becomes the leader: `fetch` is invoked exactly
    ///   once on a separate task, a successful result is stored, and the
    ///   outcome is delivered to the leader and every joiner.
    ///
    /// Errors are never stored. A failed fetch leaves existing entries
    /// untouched, and the next call after it resolves fetches again.
    ///
    /// The fetch keeps running even if every waiting caller is dropped, so a
    /// late result still refreshes the cache.
    pub async fn get<F, Fut>(
        &self,
        symbol: &Symbol,
        ttl: Duration,
        fetch: F,
    ) -> Result<Arc<TickerSnapshot>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TickerSnapshot>> + Send + 'static,
    {
        let now = Instant::now();

        let lookup = {
            let mut state = lock_state(&self.state);
            self.lookup(&mut state, symbol, now, ttl)
        };

        let in_flight = match lookup {
            Lookup::Hit(snapshot) => return Ok(snapshot),
            Lookup::Join(in_flight) => in_flight,
            Lookup::Lead(resolver, in_flight) => {
                self.spawn_fetch(symbol.clone(), resolver, fetch);
                in_flight
            }
        };

        wait_for_outcome(in_flight).await
    }

    /// Stored snapshot for `symbol` regardless of age. Never fetches.
    pub fn peek(&self, symbol: &Symbol) -> Option<Arc<TickerSnapshot>> {
        lock_state(&self.state)
            .entries
            .get(symbol)
            .map(CacheEntry::snapshot)
    }

    /// Drop every entry whose age is at least `ttl`.
    ///
    /// Outstanding fetches are left alone. Returns the number of entries removed.
    pub fn purge_expired(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut state = lock_state(&self.state);
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.is_fresh(now, ttl));
        before - state.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let state = lock_state(&self.state);
        self.counters
            .snapshot(state.entries.len(), state.in_flight.len())
    }

    pub fn len(&self) -> usize {
        lock_state(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decide hit / join / lead. Must run under the state lock so two
    /// leaders can never be registered for one symbol.
    fn lookup(
        &self,
        state: &mut CacheState,
        symbol: &Symbol,
        now: Instant,
        ttl: Duration,
    ) -> Lookup {
        if let Some(entry) = state.entries.get(symbol) {
            if entry.is_fresh(now, ttl) {
                self.counters.record_hit();
                debug!("Ticker cache hit for {}", symbol);
                return Lookup::Hit(entry.snapshot());
            }
            debug!("Ticker cache entry for {} is stale", symbol);
        }

        if let Some(in_flight) = state.in_flight.get(symbol) {
            self.counters.record_coalesced();
            debug!("Joining in-flight fetch for {}", symbol);
            return Lookup::Join(in_flight.clone());
        }

        self.counters.record_miss();
        debug!("Ticker cache miss for {}", symbol);
        let (resolver, in_flight) = watch::channel(None);
        state.in_flight.insert(symbol.clone(), in_flight.clone());
        Lookup::Lead(resolver, in_flight)
    }

    fn spawn_fetch<F, Fut>(
        &self,
        symbol: Symbol,
        resolver: watch::Sender<Option<FetchOutcome>>,
        fetch: F,
    ) where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TickerSnapshot>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let counters = Arc::clone(&self.counters);

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match AssertUnwindSafe(async move { fetch().await })
                .catch_unwind()
                .await
            {
                Ok(result) => result.map(Arc::new),
                Err(_) => Err(MarketDataError::unavailable(
                    CACHE_SOURCE,
                    format!("Ticker fetch for {} panicked", symbol),
                )),
            };

            {
                let mut state = lock_state(&state);
                if let Ok(snapshot) = &outcome {
                    state.entries.insert(
                        symbol.clone(),
                        CacheEntry::new(Arc::clone(snapshot), Instant::now()),
                    );
                }
                state.in_flight.remove(&symbol);
            }

            match &outcome {
                Ok(snapshot) => info!(
                    "Fetched ticker for {} from {} in {:?}",
                    symbol,
                    snapshot.source,
                    started.elapsed()
                ),
                Err(e) => {
                    counters.record_failure();
                    warn!("Ticker fetch for {} failed: {}", symbol, e);
                }
            }

            resolver.send_replace(Some(outcome));
        });
    }
}

impl Default for TickerCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock the cache state, recovering from poison if necessary.
///
/// Every critical section leaves both maps consistent, so a panic while
/// the lock was held cannot expose a half-written entry.
fn lock_state(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(|poisoned| {
        warn!("Ticker cache mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

async fn wait_for_outcome(mut in_flight: InFlightFetch) -> FetchOutcome {
    let resolved = match in_flight.wait_for(Option::is_some).await {
        Ok(value) => (*value).clone(),
        Err(_) => None,
    };

    resolved.unwrap_or_else(|| {
        Err(MarketDataError::unavailable(
            CACHE_SOURCE,
            "Ticker fetch ended without a result",
        ))
    })
}
