//! Market data service: the entry point used by the HTTP layer.

mod market_data_service;

#[cfg(test)]
mod service_tests;

pub use market_data_service::{
    MarketDataService, MarketDataServiceTrait, ServiceConfig, DEFAULT_OHLCV_LIMIT,
    DEFAULT_TICKER_TTL, DEFAULT_UPSTREAM_TIMEOUT, MAX_OHLCV_LIMIT,
};
