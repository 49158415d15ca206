//! Withholding on professional fees.

use calcx_common::round_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::calculator::{validated_rate, Calculation, Calculator};
use crate::error::{CalcError, CalcResult};
use crate::mode::InputMode;

/// Default retention rate (14.5%).
pub const DEFAULT_RETENTION_RATE: Decimal = Decimal::from_parts(145, 0, 0, false, 3);

/// Result of a retention calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HonorariumCalculation {
    pub gross_amount: Decimal,
    pub net_amount: Decimal,
    /// Always `gross_amount - net_amount`.
    pub retention_amount: Decimal,
    pub retention_rate: Decimal,
}

impl Calculation for HonorariumCalculation {
    fn gross_amount(&self) -> Decimal {
        self.gross_amount
    }

    fn net_amount(&self) -> Decimal {
        self.net_amount
    }

    fn deduction_amount(&self) -> Decimal {
        self.retention_amount
    }

    fn rate(&self) -> Decimal {
        self.retention_rate
    }
}

/// Retention calculator. Retention is taken out of gross:
/// `net = gross * (1 - rate)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetentionCalculator;

impl RetentionCalculator {
    /// Create a new retention calculator.
    pub fn new() -> Self {
        Self
    }

    fn from_gross(gross: Decimal, rate: Decimal) -> CalcResult<HonorariumCalculation> {
        let retention = gross
            .checked_mul(rate)
            .map(round_money)
            .ok_or(CalcError::InvalidAmount(gross))?;
        Ok(HonorariumCalculation {
            gross_amount: gross,
            net_amount: gross - retention,
            retention_amount: retention,
            retention_rate: rate,
        })
    }

    fn from_net(net: Decimal, rate: Decimal) -> CalcResult<HonorariumCalculation> {
        let gross = net
            .checked_div(Decimal::ONE - rate)
            .map(round_money)
            .ok_or(CalcError::InvalidAmount(net))?;
        Ok(HonorariumCalculation {
            gross_amount: gross,
            net_amount: net,
            retention_amount: gross - net,
            retention_rate: rate,
        })
    }
}

impl Calculator for RetentionCalculator {
    type Output = HonorariumCalculation;

    fn default_rate(&self) -> Decimal {
        DEFAULT_RETENTION_RATE
    }

    fn calculate(
        &self,
        amount: Decimal,
        mode: InputMode,
        rate: Option<Decimal>,
    ) -> CalcResult<HonorariumCalculation> {
        let rate = validated_rate(amount, rate, DEFAULT_RETENTION_RATE)?;

        let result = match mode {
            InputMode::Gross => Self::from_gross(amount, rate)?,
            InputMode::Net => Self::from_net(amount, rate)?,
        };

        trace!(%amount, %mode, %rate, retention = %result.retention_amount, "Retention calculated");
        Ok(result)
    }
}
