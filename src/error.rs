//! Crate-level error types.
//!
//! [`GttError`] unifies every error source (configuration, HTTP, JSON,
//! filesystem, brokerage session) behind a single enum so callers can
//! match on the variant they care about while still using the `?`
//! operator for easy propagation.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GttError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum GttError {
    /// Environment or file-based configuration is missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// The brokerage session is absent or the access token was rejected.
    ///
    /// Fatal to the current request; the caller should re-authenticate
    /// and [`Session::replace`](crate::session::Session::replace) the handle.
    #[error("brokerage session expired or not initialized")]
    SessionExpired,

    /// Market data for one symbol could not be obtained.
    ///
    /// The aggregator recovers from this by skipping the symbol.
    #[error("market data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// A cache file failed validation.
    ///
    /// Never leaves the cache layer: it is logged and treated as a miss.
    #[error("cache file {path} is corrupt: {reason}")]
    CacheCorrupt { path: String, reason: String },

    /// The brokerage API answered with a non-authentication error.
    #[error("broker api error: {0}")]
    Broker(String),

    /// A protective order cannot be used for the requested calculation.
    #[error("invalid protective order: {0}")]
    InvalidOrder(String),

    /// An HTTP request failed at the transport or status level.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GttError {
    /// Shorthand for a [`GttError::DataUnavailable`] about `symbol`.
    pub fn unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}
