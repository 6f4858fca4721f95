use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use coinfeed_market_data::errors::{MarketDataError, RetryClass};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MarketData(#[from] MarketDataError),
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MarketData(e) => match e {
                MarketDataError::UnknownProvider(_) => StatusCode::BAD_REQUEST,
                MarketDataError::ProviderNotConfigured(_) => StatusCode::NOT_FOUND,
                _ => match e.retry_class() {
                    RetryClass::WithBackoff => StatusCode::SERVICE_UNAVAILABLE,
                    RetryClass::Never => StatusCode::BAD_GATEWAY,
                },
            },
            ApiError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    /// The body is the error message as plain text.
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("Request failed with {}: {}", status, self);
        }
        (status, self.to_string()).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
