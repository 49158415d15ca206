//! Calculation error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by the calculators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalcError {
    /// Rate outside the open interval (0, 1).
    #[error("Rate must be greater than 0 and less than 1, got {0}")]
    InvalidRate(Decimal),

    /// Amount is zero or negative.
    #[error("Amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),
}

impl CalcError {
    /// Get error code for diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidRate(_) => "INVALID_RATE",
            CalcError::InvalidAmount(_) => "INVALID_AMOUNT",
        }
    }
}

/// Result type for calculations.
pub type CalcResult<T> = Result<T, CalcError>;
