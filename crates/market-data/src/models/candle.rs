use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::symbol::Symbol;
use super::timeframe::Timeframe;

/// A single OHLCV bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time (epoch milliseconds on the wire)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Base-asset volume
    pub volume: Decimal,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Historical candles for one pair and timeframe, ascending by timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    #[serde(rename = "data")]
    pub candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(symbol: Symbol, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
        Self {
            symbol,
            timeframe,
            candles,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}
