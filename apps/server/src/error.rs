use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coinquote_market_data::{ErrorOrigin, MarketDataError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MarketData(#[from] MarketDataError),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MarketData(e) => match e {
                MarketDataError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
                MarketDataError::SymbolNotFound(_) => StatusCode::NOT_FOUND,
                MarketDataError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
                MarketDataError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::MarketData(e) = &self {
            if e.origin() == ErrorOrigin::Upstream {
                tracing::warn!("Request failed upstream: {}", e);
            }
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
