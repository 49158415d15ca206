//! FX engine error types.

use calcx_common::CurrencyCode;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the FX engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FxError {
    /// Amount to convert is zero or negative.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Rate not available for the requested currency.
    #[error("No rate available for {0}")]
    UnknownRate(CurrencyCode),

    /// Remote response is missing a required indicator.
    #[error("Rate response is missing indicator '{0}'")]
    IncompleteRateData(String),

    /// Rate value breaks the snapshot invariants.
    #[error("Invalid rate {value} for {currency}")]
    InvalidRateValue {
        currency: CurrencyCode,
        value: Decimal,
    },

    /// Network or transport failure talking to the rate source.
    #[error("Rate source error: {0}")]
    RemoteFetchFailure(String),

    /// Snapshot could not be written to the cache.
    #[error("Failed to persist rate cache: {0}")]
    CachePersistFailure(String),

    /// Cached record could not be decoded. Treated as a cache miss.
    #[error("Failed to decode rate cache: {0}")]
    CacheDecodeFailure(String),

    /// Operation cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,
}

impl FxError {
    /// Check if the caller may reasonably try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FxError::RemoteFetchFailure(_))
    }

    /// Get error code for diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::InvalidAmount(_) => "INVALID_AMOUNT",
            FxError::UnknownRate(_) => "UNKNOWN_RATE",
            FxError::IncompleteRateData(_) => "INCOMPLETE_RATE_DATA",
            FxError::InvalidRateValue { .. } => "INVALID_RATE_VALUE",
            FxError::RemoteFetchFailure(_) => "REMOTE_FETCH_FAILURE",
            FxError::CachePersistFailure(_) => "CACHE_PERSIST_FAILURE",
            FxError::CacheDecodeFailure(_) => "CACHE_DECODE_FAILURE",
            FxError::Cancelled => "CANCELLED",
        }
    }
}

impl From<reqwest::Error> for FxError {
    fn from(err: reqwest::Error) -> Self {
        FxError::RemoteFetchFailure(err.to_string())
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
