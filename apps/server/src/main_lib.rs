use std::sync::Arc;

use coinquote_market_data::{
    MarketDataProvider, MarketDataService, MarketDataServiceTrait, ServiceConfig, TickerCache,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub market_data_service: Arc<dyn MarketDataServiceTrait + Send + Sync>,
    pub ticker_cache: Arc<TickerCache>,
}

pub fn init_tracing() {
    let log_format = std::env::var("CQ_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let provider = config.exchange.build(config.exchange_base_url.as_deref());
    tracing::info!(
        "Using exchange {} ({})",
        config.exchange,
        config
            .exchange_base_url
            .as_deref()
            .unwrap_or("default endpoint")
    );
    Ok(build_state_with_provider(config, provider))
}

/// Wire the service around an already constructed provider.
pub fn build_state_with_provider(
    config: &Config,
    provider: Arc<dyn MarketDataProvider>,
) -> Arc<AppState> {
    let ticker_cache = Arc::new(TickerCache::new());
    let market_data_service = Arc::new(MarketDataService::new(
        provider,
        ticker_cache.clone(),
        ServiceConfig {
            ticker_ttl: config.ticker_ttl,
            upstream_timeout: config.upstream_timeout,
        },
    ));

    Arc::new(AppState {
        market_data_service,
        ticker_cache,
    })
}
