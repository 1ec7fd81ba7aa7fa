//! Error types and classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The error enum for every market data operation
//! - [`ErrorOrigin`]: Whether an error is the caller's fault or the exchange's

mod origin;

pub use origin::ErrorOrigin;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MarketDataError>;

/// Errors that can occur during market data operations.
///
/// The enum is `Clone` because a single coalesced ticker fetch delivers the
/// same outcome to every caller that joined it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    /// Malformed symbol, timeframe or limit.
    /// Rejected before reaching the cache or the provider.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The exchange reports that the trading pair does not exist.
    /// Not cached and not retried automatically.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// Connectivity, protocol or decoding failure talking to the exchange.
    /// Exchange-side rate limiting is reported here as well.
    #[error("Upstream unavailable: {provider} - {message}")]
    UpstreamUnavailable {
        /// The provider that failed
        provider: String,
        /// What went wrong
        message: String,
    },

    /// The provider call exceeded its time bound.
    #[error("Upstream timeout: {provider}")]
    UpstreamTimeout {
        /// The provider that timed out
        provider: String,
    },
}

impl MarketDataError {
    /// Shorthand for [`MarketDataError::UpstreamUnavailable`].
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns where this error originated.
    ///
    /// # Examples
    ///
    /// ```
    /// use coinquote_market_data::errors::{ErrorOrigin, MarketDataError};
    ///
    /// let error = MarketDataError::InvalidParameter("limit".to_string());
    /// assert_eq!(error.origin(), ErrorOrigin::Request);
    ///
    /// let error = MarketDataError::UpstreamTimeout { provider: "BINANCE".to_string() };
    /// assert_eq!(error.origin(), ErrorOrigin::Upstream);
    /// ```
    pub fn origin(&self) -> ErrorOrigin {
        match self {
            Self::InvalidParameter(_) => ErrorOrigin::Request,
            Self::SymbolNotFound(_) => ErrorOrigin::NotFound,
            Self::UpstreamUnavailable { .. } | Self::UpstreamTimeout { .. } => {
                ErrorOrigin::Upstream
            }
        }
    }

    /// True when the caller sent a bad request.
    pub fn is_client_error(&self) -> bool {
        self.origin() == ErrorOrigin::Request
    }
}
