//! Binance spot market data provider.
//!
//! Public endpoints, no API key required:
//! - Tickers via /api/v3/ticker/24hr
//! - Candles via /api/v3/klines
//!
//! Binance weights requests per IP (1200 weight per minute). A 429 or 418
//! response means the gateway is being throttled; it is surfaced as
//! `UpstreamUnavailable` and no backoff is applied here.

mod models;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::{Candle, CandleSeries, Symbol, TickerSnapshot, Timeframe};
use crate::provider::MarketDataProvider;

use models::{Binance24hrTicker, BinanceErrorBody, INVALID_SYMBOL_CODE};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const PROVIDER_ID: &str = "BINANCE";

/// Binance spot market data provider.
pub struct BinanceProvider {
    client: Client,
    base_url: String,
}

impl BinanceProvider {
    /// Create a provider against the public Binance API.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a provider against a different host (testnet, mirror, proxy).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Make a GET request and return the decoded JSON body.
    async fn fetch(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        symbol: &Symbol,
    ) -> Result<Value, MarketDataError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Binance request: {} {:?}", endpoint, params);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body, symbol));
        }

        response.json::<Value>().await.map_err(transport_error)
    }
}

impl Default for BinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for BinanceProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_ticker(&self, symbol: &Symbol) -> Result<TickerSnapshot, MarketDataError> {
        let pair = symbol.joined("");
        let raw = self
            .fetch("/api/v3/ticker/24hr", &[("symbol", pair.as_str())], symbol)
            .await?;
        parse_ticker(symbol, raw)
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<CandleSeries, MarketDataError> {
        let pair = symbol.joined("");
        let limit = limit.to_string();
        let params = [
            ("symbol", pair.as_str()),
            ("interval", timeframe.as_str()),
            ("limit", limit.as_str()),
        ];
        let raw = self.fetch("/api/v3/klines", &params, symbol).await?;
        let candles = parse_klines(raw)?;
        Ok(CandleSeries::new(symbol.clone(), timeframe, candles))
    }
}

// ============================================================================
// Response handling
// ============================================================================

fn transport_error(e: reqwest::Error) -> MarketDataError {
    if e.is_timeout() {
        MarketDataError::UpstreamTimeout {
            provider: PROVIDER_ID.to_string(),
        }
    } else if e.is_decode() {
        MarketDataError::unavailable(PROVIDER_ID, format!("Failed to decode response: {}", e))
    } else {
        MarketDataError::unavailable(PROVIDER_ID, format!("Request failed: {}", e))
    }
}

fn classify_error(status: StatusCode, body: &str, symbol: &Symbol) -> MarketDataError {
    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
        return MarketDataError::unavailable(PROVIDER_ID, format!("Rate limited (HTTP {})", status));
    }

    match serde_json::from_str::<BinanceErrorBody>(body) {
        Ok(err) if err.code == INVALID_SYMBOL_CODE => {
            MarketDataError::SymbolNotFound(symbol.to_string())
        }
        Ok(err) => MarketDataError::unavailable(
            PROVIDER_ID,
            format!("HTTP {} - {} ({})", status, err.msg, err.code),
        ),
        Err(_) => MarketDataError::unavailable(PROVIDER_ID, format!("HTTP {} - {}", status, body)),
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, MarketDataError> {
    Decimal::from_str(raw)
        .map_err(|_| MarketDataError::unavailable(PROVIDER_ID, format!("Invalid {}: {}", field, raw)))
}

/// Binance reports an empty book side as "0.00000000".
fn parse_book_side(field: &str, raw: Option<&str>) -> Result<Option<Decimal>, MarketDataError> {
    match raw {
        Some(raw) => Ok(Some(parse_decimal(field, raw)?).filter(|d| !d.is_zero())),
        None => Ok(None),
    }
}

fn parse_timestamp(ms: i64) -> Result<DateTime<Utc>, MarketDataError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| MarketDataError::unavailable(PROVIDER_ID, format!("Invalid timestamp: {}", ms)))
}

fn parse_ticker(symbol: &Symbol, raw: Value) -> Result<TickerSnapshot, MarketDataError> {
    let ticker: Binance24hrTicker = serde_json::from_value(raw.clone()).map_err(|e| {
        MarketDataError::unavailable(PROVIDER_ID, format!("Failed to parse ticker response: {}", e))
    })?;

    let last = parse_decimal("lastPrice", &ticker.last_price)?;
    let bid = parse_book_side("bidPrice", ticker.bid_price.as_deref())?;
    let ask = parse_book_side("askPrice", ticker.ask_price.as_deref())?;
    let timestamp = parse_timestamp(ticker.close_time)?;

    Ok(
        TickerSnapshot::new(symbol.clone(), last, timestamp, PROVIDER_ID.to_string())
            .with_book(bid, ask)
            .with_info(raw),
    )
}

/// Klines are positional arrays:
/// `[openTime, open, high, low, close, volume, closeTime, ...]`
fn parse_klines(raw: Value) -> Result<Vec<Candle>, MarketDataError> {
    let rows: Vec<Vec<Value>> = serde_json::from_value(raw).map_err(|e| {
        MarketDataError::unavailable(PROVIDER_ID, format!("Failed to parse klines response: {}", e))
    })?;

    rows.iter().map(|row| parse_kline(row)).collect()
}

fn parse_kline(row: &[Value]) -> Result<Candle, MarketDataError> {
    let malformed = || MarketDataError::unavailable(PROVIDER_ID, "Malformed kline row".to_string());

    if row.len() < 6 {
        return Err(malformed());
    }
    let open_time = row[0].as_i64().ok_or_else(malformed)?;
    let field = |idx: usize, name: &str| -> Result<Decimal, MarketDataError> {
        let raw = row[idx].as_str().ok_or_else(malformed)?;
        parse_decimal(name, raw)
    };

    Ok(Candle::new(
        parse_timestamp(open_time)?,
        field(1, "open")?,
        field(2, "high")?,
        field(3, "low")?,
        field(4, "close")?,
        field(5, "volume")?,
    ))
}
