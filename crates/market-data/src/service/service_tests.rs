//! Tests for MarketDataService.
//!
//! These cover the request validation rules, the timeout bound on provider
//! calls and the interaction between the service and the ticker cache.

#[cfg(test)]
mod tests {
    use crate::cache::TickerCache;
    use crate::errors::{MarketDataError, Result};
    use crate::models::{Candle, CandleSeries, Symbol, TickerSnapshot, Timeframe};
    use crate::provider::MarketDataProvider;
    use crate::service::{
        MarketDataService, MarketDataServiceTrait, ServiceConfig, MAX_OHLCV_LIMIT,
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use futures::future::join_all;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    // =========================================================================
    // Mock provider
    // =========================================================================

    #[derive(Clone, Default)]
    struct MockProvider {
        prices: Arc<Mutex<Vec<Decimal>>>,
        ticker_error: Arc<Mutex<Option<MarketDataError>>>,
        delay: Arc<Mutex<Duration>>,
        ticker_calls: Arc<Mutex<Vec<Symbol>>>,
        ohlcv_calls: Arc<Mutex<Vec<(Symbol, Timeframe, u32)>>>,
    }

    impl MockProvider {
        fn new() -> Self {
            Self::default()
        }

        /// Successive prices returned by `fetch_ticker`; the last one repeats.
        fn with_prices(prices: Vec<Decimal>) -> Self {
            let provider = Self::new();
            *provider.prices.lock().unwrap() = prices;
            provider
        }

        fn set_ticker_error(&self, error: Option<MarketDataError>) {
            *self.ticker_error.lock().unwrap() = error;
        }

        fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = delay;
        }

        fn ticker_call_count(&self) -> usize {
            self.ticker_calls.lock().unwrap().len()
        }

        fn ohlcv_calls(&self) -> Vec<(Symbol, Timeframe, u32)> {
            self.ohlcv_calls.lock().unwrap().clone()
        }

        fn next_price(&self) -> Decimal {
            let mut prices = self.prices.lock().unwrap();
            match prices.len() {
                0 => dec!(1),
                1 => prices[0],
                _ => prices.remove(0),
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        fn id(&self) -> &'static str {
            "MOCK"
        }

        async fn fetch_ticker(&self, symbol: &Symbol) -> Result<TickerSnapshot> {
            self.ticker_calls.lock().unwrap().push(symbol.clone());
            let delay = *self.delay.lock().unwrap();
            tokio::time::sleep(delay).await;

            if let Some(error) = self.ticker_error.lock().unwrap().clone() {
                return Err(error);
            }
            Ok(TickerSnapshot::new(
                symbol.clone(),
                self.next_price(),
                Utc::now(),
                self.id().to_string(),
            ))
        }

        async fn fetch_ohlcv(
            &self,
            symbol: &Symbol,
            timeframe: Timeframe,
            limit: u32,
        ) -> Result<CandleSeries> {
            self.ohlcv_calls
                .lock()
                .unwrap()
                .push((symbol.clone(), timeframe, limit));
            let delay = *self.delay.lock().unwrap();
            tokio::time::sleep(delay).await;

            let start = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
            let step = chrono::Duration::from_std(timeframe.duration()).unwrap();
            let candles = (0..limit.min(3))
                .map(|i| {
                    Candle::new(
                        start + step * i as i32,
                        dec!(100),
                        dec!(110),
                        dec!(90),
                        dec!(105),
                        dec!(12.5),
                    )
                })
                .collect();
            Ok(CandleSeries::new(symbol.clone(), timeframe, candles))
        }
    }

    fn service_with(provider: &MockProvider) -> MarketDataService {
        MarketDataService::new(
            Arc::new(provider.clone()),
            Arc::new(TickerCache::new()),
            ServiceConfig::default(),
        )
    }

    // =========================================================================
    // Ticker
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_ticker_variants_share_one_cache_entry() {
        let provider = MockProvider::with_prices(vec![dec!(50000)]);
        let service = service_with(&provider);

        let a = service.get_ticker("BTC/USDT").await.unwrap();
        let b = service.get_ticker("btc-usdt").await.unwrap();
        let c = service.get_ticker("BTCUSDT").await.unwrap();

        assert_eq!(provider.ticker_call_count(), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
        assert_eq!(a.symbol.to_string(), "BTC/USDT");
        assert_eq!(a.source, "MOCK");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_refetched_after_ttl() {
        let provider = MockProvider::with_prices(vec![dec!(50000), dec!(51000)]);
        let service = service_with(&provider);

        assert_eq!(service.get_ticker("BTC/USDT").await.unwrap().last, dec!(50000));

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(service.get_ticker("BTC/USDT").await.unwrap().last, dec!(50000));
        assert_eq!(provider.ticker_call_count(), 1);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(service.get_ticker("BTC/USDT").await.unwrap().last, dec!(51000));
        assert_eq!(provider.ticker_call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_ticker_requests_coalesce() {
        let provider = MockProvider::with_prices(vec![dec!(3000)]);
        provider.set_delay(Duration::from_millis(200));
        let service = service_with(&provider);

        let results = join_all((0..10).map(|_| service.get_ticker("ETH/USDT"))).await;

        assert_eq!(provider.ticker_call_count(), 1);
        assert_eq!(results.len(), 10);
        for result in results {
            assert_eq!(result.unwrap().last, dec!(3000));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_failure_reaches_every_waiter_then_retries() {
        let provider = MockProvider::with_prices(vec![dec!(3000)]);
        provider.set_delay(Duration::from_millis(50));
        provider.set_ticker_error(Some(MarketDataError::unavailable("MOCK", "503")));
        let service = service_with(&provider);

        let results = join_all((0..4).map(|_| service.get_ticker("ETH/USDT"))).await;
        assert_eq!(provider.ticker_call_count(), 1);
        for result in results {
            assert!(matches!(
                result.unwrap_err(),
                MarketDataError::UpstreamUnavailable { .. }
            ));
        }

        provider.set_ticker_error(None);
        let recovered = service.get_ticker("ETH/USDT").await.unwrap();
        assert_eq!(recovered.last, dec!(3000));
        assert_eq!(provider.ticker_call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_symbol_not_found_is_not_cached() {
        let provider = MockProvider::new();
        provider.set_ticker_error(Some(MarketDataError::SymbolNotFound("FOO/BAR".into())));
        let service = service_with(&provider);

        for _ in 0..2 {
            let err = service.get_ticker("FOO/BAR").await.unwrap_err();
            assert!(matches!(err, MarketDataError::SymbolNotFound(_)));
        }
        assert_eq!(provider.ticker_call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ticker_times_out_for_all_waiters() {
        let provider = MockProvider::new();
        provider.set_delay(Duration::from_secs(60));
        let service = MarketDataService::new(
            Arc::new(provider.clone()),
            Arc::new(TickerCache::new()),
            ServiceConfig {
                upstream_timeout: Duration::from_secs(2),
                ..ServiceConfig::default()
            },
        );

        let results = join_all((0..3).map(|_| service.get_ticker("BTC/USDT"))).await;
        for result in results {
            assert_eq!(
                result.unwrap_err(),
                MarketDataError::UpstreamTimeout {
                    provider: "MOCK".to_string()
                }
            );
        }
        assert_eq!(provider.ticker_call_count(), 1);
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_symbol_never_reaches_provider() {
        let provider = MockProvider::new();
        let service = service_with(&provider);

        for raw in ["", "BTC", "BTC/", "/USDT", "BTC/US$T"] {
            let err = service.get_ticker(raw).await.unwrap_err();
            assert!(err.is_client_error(), "{raw:?} should be rejected");
        }
        assert_eq!(provider.ticker_call_count(), 0);
        assert_eq!(service.cache_stats().misses, 0);
    }

    // =========================================================================
    // OHLCV
    // =========================================================================

    #[tokio::test]
    async fn test_ohlcv_passes_normalized_request_through() {
        let provider = MockProvider::new();
        let service = service_with(&provider);

        let series = service.get_ohlcv("eth_usdt", "4h", 3).await.unwrap();

        assert_eq!(series.symbol.to_string(), "ETH/USDT");
        assert_eq!(series.timeframe, Timeframe::FourHours);
        assert_eq!(series.len(), 3);
        assert!(series
            .candles
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp));
        assert_eq!(
            provider.ohlcv_calls(),
            vec![(Symbol::parse("ETH/USDT").unwrap(), Timeframe::FourHours, 3)]
        );
    }

    #[tokio::test]
    async fn test_ohlcv_is_never_cached() {
        let provider = MockProvider::new();
        let service = service_with(&provider);

        service.get_ohlcv("BTC/USDT", "1h", 10).await.unwrap();
        service.get_ohlcv("BTC/USDT", "1h", 10).await.unwrap();

        assert_eq!(provider.ohlcv_calls().len(), 2);
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_ohlcv_limit_bounds() {
        let provider = MockProvider::new();
        let service = service_with(&provider);

        assert!(service.get_ohlcv("BTC/USDT", "1m", 1).await.is_ok());
        assert!(service
            .get_ohlcv("BTC/USDT", "1m", i64::from(MAX_OHLCV_LIMIT))
            .await
            .is_ok());

        let too_many = service.get_ohlcv("BTC/USDT", "1m", 1001).await.unwrap_err();
        assert!(too_many.to_string().contains("Limit must not exceed 1000"));

        for limit in [0, -5] {
            let err = service.get_ohlcv("BTC/USDT", "1m", limit).await.unwrap_err();
            assert_eq!(
                err,
                MarketDataError::InvalidParameter("Limit must be positive".to_string())
            );
        }

        assert_eq!(provider.ohlcv_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_ohlcv_rejects_unknown_timeframe() {
        let provider = MockProvider::new();
        let service = service_with(&provider);

        let err = service.get_ohlcv("BTC/USDT", "2h", 10).await.unwrap_err();
        assert_eq!(
            err,
            MarketDataError::InvalidParameter(
                "Invalid timeframe. Supported: 1m, 5m, 15m, 1h, 4h, 1d.".to_string()
            )
        );
        assert!(provider.ohlcv_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ohlcv_times_out() {
        let provider = MockProvider::new();
        provider.set_delay(Duration::from_secs(30));
        let service = service_with(&provider);

        let err = service.get_ohlcv("BTC/USDT", "1d", 5).await.unwrap_err();
        assert!(matches!(err, MarketDataError::UpstreamTimeout { .. }));
    }

    #[test]
    fn test_provider_id_is_exposed() {
        let provider = MockProvider::new();
        let service = service_with(&provider);
        assert_eq!(service.provider_id(), "MOCK");
        assert_eq!(service.config(), ServiceConfig::default());
    }
}
