//! Coinquote Market Data Crate
//!
//! This crate provides cached, exchange-agnostic access to cryptocurrency
//! market data for the coinquote gateway.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Ticker snapshots served from a short-lived, per-symbol cache
//! - Coalescing of concurrent cold lookups into one upstream request
//! - OHLCV candles passed straight through from the exchange
//! - Multiple exchanges: Binance, Coinbase
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   HTTP handler   | --> |  Symbol parsing  |  (BTC/USDT, btc-usdt, BTCUSDT)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                         +-------------------+
//!                         | MarketDataService |  (validation, timeouts)
//!                         +-------------------+
//!                             |            |
//!                    tickers  v            v  candles
//!                  +------------------+    |
//!                  |   TickerCache    |    |   (TTL + in-flight coalescing)
//!                  +------------------+    |
//!                             |            |
//!                             v            v
//!                          +------------------+
//!                          |    Provider      |  (Binance, Coinbase)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Symbol`] - Normalized `BASE/QUOTE` trading pair
//! - [`TickerSnapshot`] - Immutable last/bid/ask snapshot
//! - [`CandleSeries`] - OHLCV candles for one pair and timeframe
//! - [`TickerCache`] - TTL store with per-symbol fetch coalescing
//! - [`MarketDataService`] - Entry point used by the server

pub mod cache;
pub mod errors;
pub mod models;
pub mod provider;
pub mod service;

// Re-export all public types from models
pub use models::{Candle, CandleSeries, Symbol, TickerSnapshot, Timeframe};

pub use cache::{CacheStats, TickerCache};
pub use errors::{ErrorOrigin, MarketDataError, Result};

// Re-export provider types
pub use provider::binance::BinanceProvider;
pub use provider::coinbase::CoinbaseProvider;
pub use provider::{MarketDataProvider, ProviderKind};

pub use service::{
    MarketDataService, MarketDataServiceTrait, ServiceConfig, DEFAULT_OHLCV_LIMIT,
    DEFAULT_TICKER_TTL, DEFAULT_UPSTREAM_TIMEOUT, MAX_OHLCV_LIMIT,
};
