//! Response bodies for the HTTP API.

use coinquote_market_data::{CacheStats, Candle, CandleSeries, TickerSnapshot};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct Ticker {
    /// Normalized pair, e.g. `BTC/USDT`
    pub symbol: String,
    #[schema(value_type = f64)]
    pub last: Decimal,
    #[schema(value_type = Option<f64>)]
    pub bid: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub ask: Option<Decimal>,
    /// `ask - bid`, null unless both sides are quoted
    #[schema(value_type = Option<f64>)]
    pub spread: Option<Decimal>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Exchange the snapshot came from
    pub source: String,
    /// Raw upstream payload
    #[schema(value_type = Object)]
    pub info: serde_json::Value,
}

impl From<&TickerSnapshot> for Ticker {
    fn from(snapshot: &TickerSnapshot) -> Self {
        Self {
            symbol: snapshot.symbol.to_string(),
            last: snapshot.last,
            bid: snapshot.bid,
            ask: snapshot.ask,
            spread: snapshot.spread(),
            timestamp: snapshot.timestamp.timestamp_millis(),
            source: snapshot.source.clone(),
            info: snapshot.info.clone(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct OhlcvCandle {
    /// Candle open time, milliseconds since the Unix epoch
    pub timestamp: i64,
    #[schema(value_type = f64)]
    pub open: Decimal,
    #[schema(value_type = f64)]
    pub high: Decimal,
    #[schema(value_type = f64)]
    pub low: Decimal,
    #[schema(value_type = f64)]
    pub close: Decimal,
    #[schema(value_type = f64)]
    pub volume: Decimal,
}

impl From<&Candle> for OhlcvCandle {
    fn from(candle: &Candle) -> Self {
        Self {
            timestamp: candle.timestamp.timestamp_millis(),
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct Ohlcv {
    pub symbol: String,
    pub timeframe: String,
    /// Ascending by timestamp
    pub data: Vec<OhlcvCandle>,
}

impl From<CandleSeries> for Ohlcv {
    fn from(series: CandleSeries) -> Self {
        Self {
            symbol: series.symbol.to_string(),
            timeframe: series.timeframe.to_string(),
            data: series.candles.iter().map(OhlcvCandle::from).collect(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    pub exchange: String,
    pub entries: usize,
    pub in_flight: usize,
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub failures: u64,
}

impl CacheStatsResponse {
    pub fn new(exchange: &str, stats: CacheStats) -> Self {
        Self {
            exchange: exchange.to_string(),
            entries: stats.entries,
            in_flight: stats.in_flight,
            hits: stats.hits,
            misses: stats.misses,
            coalesced: stats.coalesced,
            failures: stats.failures,
        }
    }
}
