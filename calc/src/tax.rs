//! Value added tax on orders.

use calcx_common::round_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::calculator::{validated_rate, Calculation, Calculator};
use crate::error::{CalcError, CalcResult};
use crate::mode::InputMode;

/// Default tax rate (19%).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(19, 0, 0, false, 2);

/// Result of a tax calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCalculation {
    pub gross_amount: Decimal,
    pub net_amount: Decimal,
    /// Always `gross_amount - net_amount`.
    pub tax_amount: Decimal,
    pub tax_rate: Decimal,
}

impl Calculation for OrderCalculation {
    fn gross_amount(&self) -> Decimal {
        self.gross_amount
    }

    fn net_amount(&self) -> Decimal {
        self.net_amount
    }

    fn deduction_amount(&self) -> Decimal {
        self.tax_amount
    }

    fn rate(&self) -> Decimal {
        self.tax_rate
    }
}

/// Tax calculator. Gross includes tax: `gross = net * (1 + rate)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxCalculator;

impl TaxCalculator {
    /// Create a new tax calculator.
    pub fn new() -> Self {
        Self
    }

    fn from_gross(gross: Decimal, rate: Decimal) -> CalcResult<OrderCalculation> {
        let net = gross
            .checked_div(Decimal::ONE + rate)
            .map(round_money)
            .ok_or(CalcError::InvalidAmount(gross))?;
        Ok(OrderCalculation {
            gross_amount: gross,
            net_amount: net,
            tax_amount: gross - net,
            tax_rate: rate,
        })
    }

    fn from_net(net: Decimal, rate: Decimal) -> CalcResult<OrderCalculation> {
        let gross = net
            .checked_mul(Decimal::ONE + rate)
            .map(round_money)
            .ok_or(CalcError::InvalidAmount(net))?;
        Ok(OrderCalculation {
            gross_amount: gross,
            net_amount: net,
            tax_amount: gross - net,
            tax_rate: rate,
        })
    }
}

impl Calculator for TaxCalculator {
    type Output = OrderCalculation;

    fn default_rate(&self) -> Decimal {
        DEFAULT_TAX_RATE
    }

    fn calculate(
        &self,
        amount: Decimal,
        mode: InputMode,
        rate: Option<Decimal>,
    ) -> CalcResult<OrderCalculation> {
        let rate = validated_rate(amount, rate, DEFAULT_TAX_RATE)?;

        let result = match mode {
            InputMode::Gross => Self::from_gross(amount, rate)?,
            InputMode::Net => Self::from_net(amount, rate)?,
        };

        trace!(%amount, %mode, %rate, tax = %result.tax_amount, "Tax calculated");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_gross() {
        let result = TaxCalculator::new()
            .calculate(dec!(119000), InputMode::Gross, Some(dec!(0.19)))
            .unwrap();

        assert_eq!(result.net_amount, dec!(100000.00));
        assert_eq!(result.tax_amount, dec!(19000.00));
        assert_eq!(result.gross_amount, dec!(119000));
    }

    #[test]
    fn test_from_net() {
        let result = TaxCalculator::new()
            .calculate(dec!(100000), InputMode::Net, Some(dec!(0.19)))
            .unwrap();

        assert_eq!(result.gross_amount, dec!(119000.00));
        assert_eq!(result.tax_amount, dec!(19000.00));
    }

    #[test]
    fn test_default_rate() {
        let result = TaxCalculator::new()
            .calculate(dec!(1190), InputMode::Gross, None)
            .unwrap();

        assert_eq!(result.tax_rate, dec!(0.19));
        assert_eq!(result.net_amount, dec!(1000));
        assert_eq!(TaxCalculator::new().default_rate(), dec!(0.19));
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        // 10.05 / 1.01 = 9.950495..., 0.15 * 1.1 = 0.165
        let calc = TaxCalculator::new();

        let result = calc
            .calculate(dec!(10.05), InputMode::Gross, Some(dec!(0.01)))
            .unwrap();
        assert_eq!(result.net_amount, dec!(9.95));
        assert_eq!(result.tax_amount, dec!(0.10));

        let result = calc
            .calculate(dec!(0.15), InputMode::Net, Some(dec!(0.1)))
            .unwrap();
        assert_eq!(result.gross_amount, dec!(0.17));
        assert_eq!(result.tax_amount, dec!(0.02));
    }

    #[test]
    fn test_invalid_rate() {
        let calc = TaxCalculator::new();
        for rate in [dec!(0), dec!(1), dec!(-0.1), dec!(1.5)] {
            assert_eq!(
                calc.calculate(dec!(100), InputMode::Gross, Some(rate)),
                Err(CalcError::InvalidRate(rate))
            );
        }
    }

    #[test]
    fn test_invalid_amount() {
        let calc = TaxCalculator::new();
        for amount in [dec!(0), dec!(-10)] {
            assert_eq!(
                calc.calculate(amount, InputMode::Net, None),
                Err(CalcError::InvalidAmount(amount))
            );
        }
    }

    #[test]
    fn test_rate_checked_before_amount() {
        let result = TaxCalculator::new().calculate(dec!(0), InputMode::Gross, Some(dec!(2)));
        assert_eq!(result, Err(CalcError::InvalidRate(dec!(2))));
    }

    #[test]
    fn test_amount_too_large() {
        let calc = TaxCalculator::new();

        assert_eq!(
            calc.calculate(Decimal::MAX, InputMode::Net, None),
            Err(CalcError::InvalidAmount(Decimal::MAX))
        );
        assert!(calc.calculate(Decimal::MAX, InputMode::Gross, None).is_ok());
    }

    proptest! {
        #[test]
        fn prop_gross_net_round_trip(cents in 1i64..100_000_000_000, bps in 1i64..10_000) {
            let calc = TaxCalculator::new();
            let gross = Decimal::new(cents, 2);
            let rate = Decimal::new(bps, 4);

            let forward = calc.calculate(gross, InputMode::Gross, Some(rate)).unwrap();
            prop_assert_eq!(forward.tax_amount, forward.gross_amount - forward.net_amount);

            let back = calc.calculate(forward.net_amount, InputMode::Net, Some(rate)).unwrap();
            prop_assert!((back.gross_amount - gross).abs() <= dec!(0.01));
        }
    }
}
