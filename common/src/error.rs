//! Error types shared by CalcX crates.

use thiserror::Error;

/// Errors raised while building common types from external input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Currency code outside the supported set.
    #[error("Unsupported currency code: {0}")]
    UnknownCurrency(String),
}
