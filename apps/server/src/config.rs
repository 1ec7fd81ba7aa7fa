use std::{net::SocketAddr, time::Duration};

use anyhow::{anyhow, Context};
use coinquote_market_data::ProviderKind;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    /// Bound on a whole HTTP request
    pub request_timeout: Duration,
    /// Bound on a single exchange call
    pub upstream_timeout: Duration,
    pub ticker_ttl: Duration,
    pub exchange: ProviderKind,
    pub exchange_base_url: Option<String>,
    /// Zero disables the background sweep
    pub cache_sweep_interval: Duration,
}

impl Config {
    /// Load `.env` if present, then read `CQ_*` variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset keys take their defaults;
    /// values that are set but malformed are an error.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let listen_addr: SocketAddr = var("CQ_LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .context("Invalid CQ_LISTEN_ADDR")?;
        let cors_allow = var("CQ_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let request_timeout = millis(&var("CQ_REQUEST_TIMEOUT_MS", "30000"), "CQ_REQUEST_TIMEOUT_MS")?;
        let upstream_timeout =
            millis(&var("CQ_UPSTREAM_TIMEOUT_MS", "10000"), "CQ_UPSTREAM_TIMEOUT_MS")?;
        let ticker_ttl = millis(&var("CQ_TICKER_TTL_MS", "5000"), "CQ_TICKER_TTL_MS")?;
        let exchange: ProviderKind = var("CQ_EXCHANGE", "binance")
            .parse()
            .map_err(|e| anyhow!("Invalid CQ_EXCHANGE: {}", e))?;
        let exchange_base_url = lookup("CQ_EXCHANGE_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());
        let sweep_secs: u64 = var("CQ_CACHE_SWEEP_INTERVAL_SECS", "60")
            .parse()
            .context("Invalid CQ_CACHE_SWEEP_INTERVAL_SECS")?;

        for (name, value) in [
            ("CQ_REQUEST_TIMEOUT_MS", request_timeout),
            ("CQ_UPSTREAM_TIMEOUT_MS", upstream_timeout),
            ("CQ_TICKER_TTL_MS", ticker_ttl),
        ] {
            if value.is_zero() {
                return Err(anyhow!("{} must be greater than zero", name));
            }
        }

        Ok(Self {
            listen_addr,
            cors_allow,
            request_timeout,
            upstream_timeout,
            ticker_ttl,
            exchange,
            exchange_base_url,
            cache_sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(30_000),
            upstream_timeout: Duration::from_millis(10_000),
            ticker_ttl: Duration::from_millis(5_000),
            exchange: ProviderKind::default(),
            exchange_base_url: None,
            cache_sweep_interval: Duration::from_secs(60),
        }
    }
}

fn millis(raw: &str, name: &str) -> anyhow::Result<Duration> {
    let ms: u64 = raw
        .parse()
        .with_context(|| format!("Invalid {}: expected milliseconds, got '{}'", name, raw))?;
    Ok(Duration::from_millis(ms))
}
