//! Currency conversion types and operations.

use calcx_common::{round_conversion, CurrencyCode, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};
use crate::snapshot::RateSnapshot;

/// Represents a completed currency conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// Currency converted from.
    pub source: CurrencyCode,
    /// Currency converted to.
    pub target: CurrencyCode,
    /// Input amount.
    pub source_amount: Decimal,
    /// Output amount, rounded to four fractional digits.
    pub target_amount: Decimal,
    /// Retrieval time of the snapshot that priced the conversion.
    pub as_of: Timestamp,
}

impl ConversionResult {
    /// Convert `amount` by pivoting through the base currency.
    ///
    /// An amount too large to represent once priced is rejected as invalid.
    pub fn price(
        snapshot: &RateSnapshot,
        amount: Decimal,
        source: CurrencyCode,
        target: CurrencyCode,
    ) -> FxResult<Self> {
        let source_rate = snapshot.rate_of(source)?;
        let target_rate = snapshot.rate_of(target)?;

        let amount_in_base = if source.is_base() {
            Some(amount)
        } else {
            amount.checked_mul(source_rate)
        };
        let target_amount = amount_in_base
            .and_then(|value| {
                if target.is_base() {
                    Some(value)
                } else {
                    value.checked_div(target_rate)
                }
            })
            .ok_or(FxError::InvalidAmount(amount))?;

        Ok(Self {
            source,
            target,
            source_amount: amount,
            target_amount: round_conversion(target_amount),
            as_of: snapshot.retrieved_at(),
        })
    }
}

/// One row of the reference rate table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRate {
    pub currency: CurrencyCode,
    /// Value of one unit in the base currency.
    pub rate_to_base: Decimal,
}

impl ReferenceRate {
    /// Rows for every rate in `snapshot`, base first.
    pub fn table(snapshot: &RateSnapshot) -> Vec<ReferenceRate> {
        snapshot
            .rates()
            .iter()
            .map(|(currency, rate)| ReferenceRate {
                currency: *currency,
                rate_to_base: if currency.is_base() {
                    Decimal::ONE
                } else {
                    round_conversion(*rate)
                },
            })
            .collect()
    }
}
