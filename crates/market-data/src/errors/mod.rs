//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all fetch and dispatch operations
//! - [`ConfigError`]: Errors raised while loading coin and provider configuration
//! - [`RetryClass`]: Classification the caller can use to decide on a retry policy

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching or dispatching market data.
///
/// Adapters never retry on their own. Each variant is classified into a
/// [`RetryClass`] via [`retry_class`](Self::retry_class) so the caller can
/// decide whether polling again is worthwhile.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider name does not match any known provider.
    /// Raised before any network activity.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The provider is known but no connection settings were supplied for it.
    #[error("provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// The upstream answered with a non-success status code.
    #[error("{provider} API returned status {status}")]
    UpstreamHttp {
        /// The provider that returned the status
        provider: String,
        /// The HTTP status code
        status: u16,
    },

    /// The request never produced a response (DNS, connection refused, TLS, ...).
    #[error("{provider} request failed: {message}")]
    UpstreamTransport {
        /// The provider being contacted
        provider: String,
        /// The underlying transport error
        message: String,
    },

    /// The adapter's HTTP client could not be built (e.g. TLS backend failure).
    #[error("{provider} HTTP client could not be built: {message}")]
    ClientInit {
        /// The provider whose client failed
        provider: String,
        /// The builder error
        message: String,
    },

    /// The request exceeded the adapter's configured timeout.
    #[error("{provider} request timed out")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("{provider} returned a malformed response: {message}")]
    MalformedResponse {
        /// The provider whose payload failed to decode
        provider: String,
        /// Description of the decode failure
        message: String,
    },

    /// The upstream answered successfully but with an empty payload.
    #[error("{provider} returned no data")]
    NoDataReturned {
        /// The provider that returned nothing
        provider: String,
    },
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::Never`]: the same request will fail the same way
    /// - [`RetryClass::WithBackoff`]: the upstream may recover, poll again later
    ///
    /// # Examples
    ///
    /// ```
    /// use coinfeed_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::Timeout { provider: "BINANCE".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::UnknownProvider("kraken".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::UnknownProvider(_)
            | Self::ProviderNotConfigured(_)
            | Self::ClientInit { .. }
            | Self::MalformedResponse { .. }
            | Self::NoDataReturned { .. } => RetryClass::Never,

            Self::UpstreamTransport { .. } | Self::Timeout { .. } => RetryClass::WithBackoff,

            // Rate limiting and server-side failures are transient
            Self::UpstreamHttp { status, .. } => {
                if *status == 429 || *status >= 500 {
                    RetryClass::WithBackoff
                } else {
                    RetryClass::Never
                }
            }
        }
    }

    /// Build a transport error from a reqwest failure, separating timeouts.
    pub(crate) fn from_transport(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else {
            Self::UpstreamTransport {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub(crate) fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

/// Errors raised while loading the coin list or provider settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
