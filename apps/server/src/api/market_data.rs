use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use coinquote_market_data::{Timeframe, DEFAULT_OHLCV_LIMIT};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::{CacheStatsResponse, Ohlcv, Ticker},
};

/// Wildcard captures may carry the separating slash.
fn symbol_from_path(raw: &str) -> &str {
    raw.trim_start_matches('/')
}

#[utoipa::path(
    get,
    path = "/api/v1/ticker/{symbol}",
    params(("symbol" = String, Path, description = "Trading pair, e.g. BTC/USDT, btc-usdt or BTCUSDT")),
    responses(
        (status = 200, body = Ticker),
        (status = 400, description = "Malformed symbol"),
        (status = 404, description = "Unknown pair"),
        (status = 502, description = "Exchange unavailable"),
        (status = 504, description = "Exchange timed out"),
    )
)]
pub async fn get_ticker(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<Ticker>> {
    let snapshot = state
        .market_data_service
        .get_ticker(symbol_from_path(&symbol))
        .await?;
    Ok(Json(Ticker::from(snapshot.as_ref())))
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct OhlcvQuery {
    /// One of 1m, 5m, 15m, 1h, 4h, 1d (default 1h)
    pub timeframe: Option<String>,
    /// Number of candles, 1 to 1000 (default 100)
    pub limit: Option<String>,
}

impl OhlcvQuery {
    fn timeframe(&self) -> String {
        self.timeframe
            .clone()
            .unwrap_or_else(|| Timeframe::default().to_string())
    }

    fn limit(&self) -> ApiResult<i64> {
        match self.limit.as_deref().map(str::trim) {
            None | Some("") => Ok(i64::from(DEFAULT_OHLCV_LIMIT)),
            Some(raw) => raw
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("Limit must be an integer, got '{}'", raw))),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/ohlcv/{symbol}",
    params(
        ("symbol" = String, Path, description = "Trading pair, e.g. BTC/USDT"),
        OhlcvQuery
    ),
    responses(
        (status = 200, body = Ohlcv),
        (status = 400, description = "Malformed symbol, timeframe or limit"),
        (status = 404, description = "Unknown pair"),
        (status = 502, description = "Exchange unavailable"),
        (status = 504, description = "Exchange timed out"),
    )
)]
pub async fn get_ohlcv(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<OhlcvQuery>,
) -> ApiResult<Json<Ohlcv>> {
    let limit = query.limit()?;
    let series = state
        .market_data_service
        .get_ohlcv(symbol_from_path(&symbol), &query.timeframe(), limit)
        .await?;
    Ok(Json(Ohlcv::from(series)))
}

#[utoipa::path(get, path = "/api/v1/cache/stats", responses((status = 200, body = CacheStatsResponse)))]
pub async fn get_cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    let service = &state.market_data_service;
    Json(CacheStatsResponse::new(
        service.provider_id(),
        service.cache_stats(),
    ))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ticker/{*symbol}", get(get_ticker))
        .route("/ohlcv/{*symbol}", get(get_ohlcv))
        .route("/cache/stats", get(get_cache_stats))
}
