use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::symbol::Symbol;

/// Point-in-time ticker for one trading pair.
///
/// Snapshots are never mutated once built; a newer fetch replaces the
/// cached `Arc<TickerSnapshot>` as a whole.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    /// Pair this ticker describes
    pub symbol: Symbol,

    /// Last traded price
    pub last: Decimal,

    /// Best bid, when the exchange reports one
    pub bid: Option<Decimal>,

    /// Best ask, when the exchange reports one
    pub ask: Option<Decimal>,

    /// Capture time reported by the exchange (epoch milliseconds on the wire)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Provider that produced the snapshot (BINANCE, COINBASE, ...)
    pub source: String,

    /// Raw exchange payload
    #[serde(default)]
    pub info: serde_json::Value,
}

impl TickerSnapshot {
    /// Create a snapshot with only a last price.
    pub fn new(symbol: Symbol, last: Decimal, timestamp: DateTime<Utc>, source: String) -> Self {
        Self {
            symbol,
            last,
            bid: None,
            ask: None,
            timestamp,
            source,
            info: serde_json::Value::Null,
        }
    }

    /// Attach best bid/ask.
    pub fn with_book(mut self, bid: Option<Decimal>, ask: Option<Decimal>) -> Self {
        self.bid = bid;
        self.ask = ask;
        self
    }

    /// Attach the raw exchange payload.
    pub fn with_info(mut self, info: serde_json::Value) -> Self {
        self.info = info;
        self
    }

    /// Ask minus bid, when both sides are known.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }
}
