//! Binance REST API response models.

use serde::Deserialize;

/// Response from /api/v3/ticker/24hr for a single symbol
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binance24hrTicker {
    pub last_price: String,
    pub bid_price: Option<String>,
    pub ask_price: Option<String>,
    /// Statistics window close time (ms), used as the capture timestamp
    pub close_time: i64,
    // Note: price change, volume and weighted average fields exist but are
    // only passed through in the raw `info` payload
}

/// Error body returned with non-2xx responses
#[derive(Debug, Deserialize)]
pub struct BinanceErrorBody {
    pub code: i64,
    pub msg: String,
}

/// Binance error code for an unknown trading pair
pub const INVALID_SYMBOL_CODE: i64 = -1121;
