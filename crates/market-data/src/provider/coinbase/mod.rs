//! Coinbase Exchange market data provider.
//!
//! Public endpoints, no API key required:
//! - Tickers via /products/{product_id}/ticker
//! - Candles via /products/{product_id}/candles
//!
//! Coinbase has no 4h granularity and returns at most 300 candles per
//! request, newest first.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::{Candle, CandleSeries, Symbol, TickerSnapshot, Timeframe};
use crate::provider::MarketDataProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.exchange.coinbase.com";
const PROVIDER_ID: &str = "COINBASE";
const USER_AGENT: &str = concat!("coinquote/", env!("CARGO_PKG_VERSION"));
/// Most candles Coinbase returns for one request
pub const MAX_CANDLES_PER_REQUEST: u32 = 300;

/// Response from /products/{id}/ticker
#[derive(Debug, Deserialize)]
struct CoinbaseTicker {
    price: String,
    bid: Option<String>,
    ask: Option<String>,
    time: Option<String>,
}

/// Error body returned with non-2xx responses
#[derive(Debug, Deserialize)]
struct CoinbaseErrorBody {
    message: String,
}

/// Coinbase Exchange market data provider.
pub struct CoinbaseProvider {
    client: Client,
    base_url: String,
}

impl CoinbaseProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        symbol: &Symbol,
    ) -> Result<Value, MarketDataError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Coinbase request: {} {:?}", endpoint, params);

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

impl Default for CoinbaseProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for CoinbaseProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_ticker(&self, symbol: &Symbol) -> Result<TickerSnapshot, MarketDataError> {
        let endpoint = format!("/products/{}/ticker", symbol.joined("-"));
        let raw = self.fetch(&endpoint, &[], symbol).await?;
        parse_ticker(symbol, raw)
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<CandleSeries, MarketDataError> {
        check_limit(limit)?;
        let granularity = granularity(timeframe)?.to_string();
        let endpoint = format!("/products/{}/candles", symbol.joined("-"));
        let raw = self
            .fetch(&endpoint, &[("granularity", granularity.as_str())], symbol)
            .await?;
        let candles = parse_candles(raw, limit as usize)?;
        Ok(CandleSeries::new(symbol.clone(), timeframe, candles))
    }
}

/// Candle granularity in seconds.
fn granularity(timeframe: Timeframe) -> Result<u64, MarketDataError> {
    match timeframe {
        Timeframe::FourHours => Err(MarketDataError::InvalidParameter(
            "Timeframe 4h is not supported by COINBASE".to_string(),
        )),
        other => Ok(other.duration().as_secs()),
    }
}

/// Reject counts a single candles request cannot satisfy.
fn check_limit(limit: u32) -> Result<(), MarketDataError> {
    if limit > MAX_CANDLES_PER_REQUEST {
        return Err(MarketDataError::InvalidParameter(format!(
            "Limit must not exceed {} for COINBASE (got {})",
            MAX_CANDLES_PER_REQUEST, limit
        )));
    }
    Ok(())
}

fn transport_error(e: reqwest::Error) -> MarketDataError {
    if e.is_timeout() {
        MarketDataError::UpstreamTimeout {
            provider: PROVIDER_ID.to_string(),
        }
    } else {
        MarketDataError::unavailable(PROVIDER_ID, format!("Request failed: {}", e))
    }
}

fn classify_error(status: StatusCode, body: &str, symbol: &Symbol) -> MarketDataError {
    if status == StatusCode::NOT_FOUND {
        return MarketDataError::SymbolNotFound(symbol.to_string());
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return MarketDataError::unavailable(PROVIDER_ID, "Rate limited (HTTP 429)".to_string());
    }

    let message = serde_json::from_str::<CoinbaseErrorBody>(body)
        .map(|err| err.message)
        .unwrap_or_else(|_| body.to_string());
    MarketDataError::unavailable(PROVIDER_ID, format!("HTTP {} - {}", status, message))
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, MarketDataError> {
    Decimal::from_str(raw)
        .map_err(|_| MarketDataError::unavailable(PROVIDER_ID, format!("Invalid {}: {}", field, raw)))
}

fn parse_ticker(symbol: &Symbol, raw: Value) -> Result<TickerSnapshot, MarketDataError> {
    let ticker: CoinbaseTicker = serde_json::from_value(raw.clone()).map_err(|e| {
        MarketDataError::unavailable(PROVIDER_ID, format!("Failed to parse ticker response: {}", e))
    })?;

    let last = parse_decimal("price", &ticker.price)?;
    let bid = ticker.bid.as_deref().map(|b| parse_decimal("bid", b)).transpose()?;
    let ask = ticker.ask.as_deref().map(|a| parse_decimal("ask", a)).transpose()?;
    let timestamp = ticker
        .time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Ok(
        TickerSnapshot::new(symbol.clone(), last, timestamp, PROVIDER_ID.to_string())
            .with_book(bid, ask)
            .with_info(raw),
    )
}

/// Candle rows are `[time, low, high, open, close, volume]`, newest first.
/// Keeps the newest `limit` rows and returns them oldest first.
fn parse_candles(raw: Value, limit: usize) -> Result<Vec<Candle>, MarketDataError> {
    let rows: Vec<[f64; 6]> = serde_json::from_value(raw).map_err(|e| {
        MarketDataError::unavailable(PROVIDER_ID, format!("Failed to parse candles response: {}", e))
    })?;

    let mut candles = rows
        .iter()
        .take(limit)
        .map(|row| {
            let [time, low, high, open, close, volume] = *row;
            let timestamp = Utc
                .timestamp_opt(time as i64, 0)
                .single()
                .ok_or_else(|| {
                    MarketDataError::unavailable(PROVIDER_ID, format!("Invalid candle time: {}", time))
                })?;
            Ok(Candle::new(
                timestamp,
                to_decimal("open", open)?,
                to_decimal("high", high)?,
                to_decimal("low", low)?,
                to_decimal("close", close)?,
                to_decimal("volume", volume)?,
            ))
        })
        .collect::<Result<Vec<_>, MarketDataError>>()?;

    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

fn to_decimal(field: &str, value: f64) -> Result<Decimal, MarketDataError> {
    Decimal::try_from(value)
        .map_err(|_| MarketDataError::unavailable(PROVIDER_ID, format!("Invalid {}: {}", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn eth() -> Symbol {
        Symbol::parse("ETH-USD").unwrap()
    }

    #[test]
    fn test_provider_id() {
        assert_eq!(CoinbaseProvider::new().id(), "COINBASE");
    }

    #[test]
    fn test_granularity() {
        assert_eq!(granularity(Timeframe::OneMinute).unwrap(), 60);
        assert_eq!(granularity(Timeframe::OneDay).unwrap(), 86_400);
        assert!(matches!(
            granularity(Timeframe::FourHours),
            Err(MarketDataError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_check_limit() {
        assert!(check_limit(1).is_ok());
        assert!(check_limit(MAX_CANDLES_PER_REQUEST).is_ok());
        let err = check_limit(MAX_CANDLES_PER_REQUEST + 1).unwrap_err();
        assert_eq!(
            err,
            MarketDataError::InvalidParameter(
                "Limit must not exceed 300 for COINBASE (got 301)".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_fetch_ohlcv_rejects_limit_above_page_size_without_request() {
        // Nothing listens here; the limit is rejected before any request is made
        let provider = CoinbaseProvider::with_base_url("http://127.0.0.1:9");
        let err = provider
            .fetch_ohlcv(&eth(), Timeframe::OneHour, 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidParameter(_)));
    }

    #[test]
    fn test_parse_ticker() {
        let raw = json!({
            "trade_id": 86326522,
            "price": "1650.25",
            "size": "0.01",
            "bid": "1650.20",
            "ask": "1650.30",
            "volume": "12345.6",
            "time": "2023-03-15T13:20:00.000000Z"
        });

        let ticker = parse_ticker(&eth(), raw).unwrap();
        assert_eq!(ticker.last, dec!(1650.25));
        assert_eq!(ticker.spread(), Some(dec!(0.10)));
        assert_eq!(ticker.source, "COINBASE");
        assert_eq!(ticker.timestamp.to_rfc3339(), "2023-03-15T13:20:00+00:00");
    }

    #[test]
    fn test_parse_candles_sorted_and_truncated() {
        let raw = json!([
            [1678892400, 60300.0, 60700.0, 60400.0, 60650.0, 8.2],
            [1678888800, 59900.0, 60500.0, 60000.0, 60400.0, 10.5],
            [1678885200, 59000.0, 60100.0, 59500.0, 60000.0, 7.0]
        ]);

        let candles = parse_candles(raw, 2).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp.timestamp(), 1678888800);
        assert_eq!(candles[0].open, dec!(60000));
        assert_eq!(candles[0].low, dec!(59900));
        assert_eq!(candles[1].close, dec!(60650));
    }

    #[test]
    fn test_classify_not_found() {
        let err = classify_error(StatusCode::NOT_FOUND, r#"{"message":"NotFound"}"#, &eth());
        assert_eq!(err, MarketDataError::SymbolNotFound("ETH/USD".to_string()));
    }

    #[test]
    fn test_classify_server_error_uses_message() {
        let err = classify_error(
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"message":"maintenance"}"#,
            &eth(),
        );
        assert!(err.to_string().contains("maintenance"));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_ticker_live() {
        let ticker = CoinbaseProvider::new().fetch_ticker(&eth()).await.unwrap();
        assert!(ticker.last > Decimal::ZERO);
    }
}
