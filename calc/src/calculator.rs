//! Shared calculator contract.

use rust_decimal::Decimal;

use crate::error::{CalcError, CalcResult};
use crate::mode::InputMode;

/// A gross/net calculator with a default rate.
pub trait Calculator {
    /// Result shape produced by this calculator.
    type Output: Calculation;

    /// Rate applied when the caller supplies none.
    fn default_rate(&self) -> Decimal;

    /// Solve for the other side of `amount`.
    fn calculate(
        &self,
        amount: Decimal,
        mode: InputMode,
        rate: Option<Decimal>,
    ) -> CalcResult<Self::Output>;
}

/// Common view over calculation results.
pub trait Calculation {
    fn gross_amount(&self) -> Decimal;
    fn net_amount(&self) -> Decimal;
    fn deduction_amount(&self) -> Decimal;
    fn rate(&self) -> Decimal;
}

/// Resolve the effective rate and validate both inputs, rate first.
pub(crate) fn validated_rate(
    amount: Decimal,
    rate: Option<Decimal>,
    default_rate: Decimal,
) -> CalcResult<Decimal> {
    let rate = rate.unwrap_or(default_rate);
    if rate <= Decimal::ZERO || rate >= Decimal::ONE {
        return Err(CalcError::InvalidRate(rate));
    }
    if amount <= Decimal::ZERO {
        return Err(CalcError::InvalidAmount(amount));
    }
    Ok(rate)
}
