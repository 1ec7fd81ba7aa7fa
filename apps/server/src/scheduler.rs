//! Background cache maintenance.
//!
//! Expired ticker snapshots are only replaced when the same pair is asked for
//! again, so pairs that stop being requested would otherwise stay in memory
//! for the life of the process.

use std::sync::Arc;
use std::time::Duration;

use coinquote_market_data::TickerCache;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Start the periodic sweep. Returns `None` when `every` is zero.
pub fn start_cache_sweeper(
    cache: Arc<TickerCache>,
    ttl: Duration,
    every: Duration,
) -> Option<JoinHandle<()>> {
    if every.is_zero() {
        info!("Ticker cache sweeper disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        info!("Ticker cache sweeper started ({:?} interval)", every);

        let mut sweep_interval = interval(every);
        sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; nothing can be stale yet.
        sweep_interval.tick().await;

        loop {
            sweep_interval.tick().await;
            run_sweep(&cache, ttl);
        }
    }))
}

fn run_sweep(cache: &TickerCache, ttl: Duration) {
    let removed = cache.purge_expired(ttl);
    if removed > 0 {
        debug!(
            "Ticker cache sweep removed {} expired entries ({} remaining)",
            removed,
            cache.len()
        );
    }
}
