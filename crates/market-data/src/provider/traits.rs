//! Market data provider trait definitions.
//!
//! This module defines the `MarketDataProvider` trait that every exchange
//! connector implements.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{CandleSeries, Symbol, TickerSnapshot, Timeframe};

/// Trait for upstream exchange connectors.
///
/// Implementations only translate between the exchange API and the crate's
/// models. Caching, coalescing and timeouts are applied by
/// [`MarketDataService`](crate::service::MarketDataService), so a provider
/// should make exactly one upstream request per call.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use coinquote_market_data::provider::MarketDataProvider;
///
/// struct MyExchange;
///
/// #[async_trait]
/// impl MarketDataProvider for MyExchange {
///     fn id(&self) -> &'static str {
///         "MY_EXCHANGE"
///     }
///
///     // ... implement fetch methods
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "BINANCE" or "COINBASE".
    /// Used for logging, error attribution and the `source` of snapshots.
    fn id(&self) -> &'static str;

    /// Fetch the current ticker for a pair.
    ///
    /// # Returns
    ///
    /// The latest ticker on success. Unknown pairs must be reported as
    /// [`MarketDataError::SymbolNotFound`].
    async fn fetch_ticker(&self, symbol: &Symbol) -> Result<TickerSnapshot, MarketDataError>;

    /// Fetch up to `limit` most recent candles for a pair.
    ///
    /// `limit` has already been validated by the caller.
    /// The candles should be ordered by timestamp ascending.
    async fn fetch_ohlcv(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<CandleSeries, MarketDataError>;
}
