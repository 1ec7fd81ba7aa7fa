//! Ticker and OHLCV lookups on top of one exchange connector.
//!
//! Tickers go through the shared [`TickerCache`]; OHLCV requests are passed
//! straight to the provider. Every upstream call is bounded by
//! [`ServiceConfig::upstream_timeout`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::{CacheStats, TickerCache};
use crate::errors::{MarketDataError, Result};
use crate::models::{CandleSeries, Symbol, TickerSnapshot, Timeframe};
use crate::provider::MarketDataProvider;

pub const DEFAULT_TICKER_TTL: Duration = Duration::from_secs(5);
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_OHLCV_LIMIT: u32 = 100;
pub const MAX_OHLCV_LIMIT: u32 = 1000;

/// Fixed at process start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// How long a ticker snapshot is served without refetching
    pub ticker_ttl: Duration,
    /// Upper bound for a single provider call
    pub upstream_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            ticker_ttl: DEFAULT_TICKER_TTL,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

#[async_trait]
pub trait MarketDataServiceTrait: Send + Sync {
    /// Current ticker for a raw pair such as `btc-usdt`.
    ///
    /// Served from the cache when fresh; concurrent cold requests for the
    /// same pair share one upstream call.
    async fn get_ticker(&self, symbol: &str) -> Result<Arc<TickerSnapshot>>;

    /// Recent candles for a raw pair. Never cached.
    ///
    /// `limit` must be in `1..=1000`; `timeframe` one of `1m, 5m, 15m, 1h, 4h, 1d`.
    async fn get_ohlcv(&self, symbol: &str, timeframe: &str, limit: i64) -> Result<CandleSeries>;

    /// Identifier of the configured exchange, e.g. "BINANCE".
    fn provider_id(&self) -> &'static str;

    fn cache_stats(&self) -> CacheStats;
}

pub struct MarketDataService {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<TickerCache>,
    config: ServiceConfig,
}

impl MarketDataService {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        cache: Arc<TickerCache>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            config,
        }
    }

    pub fn config(&self) -> ServiceConfig {
        self.config
    }

    pub fn cache(&self) -> &Arc<TickerCache> {
        &self.cache
    }
}

#[async_trait]
impl MarketDataServiceTrait for MarketDataService {
    async fn get_ticker(&self, symbol: &str) -> Result<Arc<TickerSnapshot>> {
        let symbol = Symbol::parse(symbol)?;

        let provider = Arc::clone(&self.provider);
        let upstream_timeout = self.config.upstream_timeout;
        let fetch_symbol = symbol.clone();
        let fetch = move || async move {
            with_timeout(provider.id(), upstream_timeout, provider.fetch_ticker(&fetch_symbol))
                .await
        };

        self.cache.get(&symbol, self.config.ticker_ttl, fetch).await
    }

    async fn get_ohlcv(&self, symbol: &str, timeframe: &str, limit: i64) -> Result<CandleSeries> {
        let limit = validate_limit(limit)?;
        let timeframe: Timeframe = timeframe.parse()?;
        let symbol = Symbol::parse(symbol)?;

        debug!(
            "Fetching {} {} candles for {} from {}",
            limit,
            timeframe,
            symbol,
            self.provider.id()
        );

        with_timeout(
            self.provider.id(),
            self.config.upstream_timeout,
            self.provider.fetch_ohlcv(&symbol, timeframe, limit),
        )
        .await
    }

    fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Check a requested candle count against `1..=MAX_OHLCV_LIMIT`.
pub(crate) fn validate_limit(limit: i64) -> Result<u32> {
    if limit < 1 {
        return Err(MarketDataError::InvalidParameter(
            "Limit must be positive".to_string(),
        ));
    }
    if limit > i64::from(MAX_OHLCV_LIMIT) {
        return Err(MarketDataError::InvalidParameter(format!(
            "Limit must not exceed {} (got {})",
            MAX_OHLCV_LIMIT, limit
        )));
    }
    u32::try_from(limit).map_err(|_| {
        MarketDataError::InvalidParameter(format!("Limit out of range: {}", limit))
    })
}

async fn with_timeout<T>(
    provider: &'static str,
    bound: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(bound, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} did not respond within {:?}", provider, bound);
            Err(MarketDataError::UpstreamTimeout {
                provider: provider.to_string(),
            })
        }
    }
}
