//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all exchange connectors implement
//! - Concrete connectors (Binance, Coinbase)
//! - `ProviderKind`, the startup-time exchange selection
//!
//! Providers are deliberately thin: they issue one upstream request per
//! call and map the exchange's failures onto `MarketDataError`. Everything
//! that protects the exchange from redundant traffic lives in the cache and
//! service layers.

mod traits;

pub mod binance;
pub mod coinbase;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use binance::BinanceProvider;
pub use coinbase::CoinbaseProvider;
pub use traits::MarketDataProvider;

use crate::errors::MarketDataError;

/// Exchange selected at process start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    Binance,
    Coinbase,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Binance => "binance",
            ProviderKind::Coinbase => "coinbase",
        }
    }

    /// Build the connector, optionally against a non-default host.
    pub fn build(&self, base_url: Option<&str>) -> Arc<dyn MarketDataProvider> {
        match (self, base_url) {
            (ProviderKind::Binance, Some(url)) => Arc::new(BinanceProvider::with_base_url(url)),
            (ProviderKind::Binance, None) => Arc::new(BinanceProvider::new()),
            (ProviderKind::Coinbase, Some(url)) => Arc::new(CoinbaseProvider::with_base_url(url)),
            (ProviderKind::Coinbase, None) => Arc::new(CoinbaseProvider::new()),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(ProviderKind::Binance),
            "coinbase" => Ok(ProviderKind::Coinbase),
            other => Err(MarketDataError::InvalidParameter(format!(
                "Unknown exchange '{}'. Supported: binance, coinbase",
                other
            ))),
        }
    }
}
