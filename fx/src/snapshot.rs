//! Point-in-time rate snapshots.

use std::collections::BTreeMap;

use calcx_common::{is_within, CurrencyCode, Timestamp};
use chrono::Duration;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{FxError, FxResult};

/// Rates of every known currency expressed in the base currency, as retrieved
/// at one instant.
///
/// The base currency is always present with rate one and every other rate is
/// strictly positive. Fields are private so a snapshot can only be built
/// through [`RateSnapshot::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSnapshot {
    retrieved_at: Timestamp,
    rates_to_base: BTreeMap<CurrencyCode, Decimal>,
}

impl RateSnapshot {
    /// Build a snapshot, inserting the base rate and validating the rest.
    pub fn new(
        retrieved_at: Timestamp,
        rates: impl IntoIterator<Item = (CurrencyCode, Decimal)>,
    ) -> FxResult<Self> {
        let mut rates_to_base = BTreeMap::new();

        for (currency, value) in rates {
            let valid = if currency.is_base() {
                value == Decimal::ONE
            } else {
                value > Decimal::ZERO
            };
            if !valid {
                return Err(FxError::InvalidRateValue { currency, value });
            }
            rates_to_base.insert(currency, value);
        }
        rates_to_base.insert(CurrencyCode::BASE, Decimal::ONE);

        Ok(Self {
            retrieved_at,
            rates_to_base,
        })
    }

    /// When the rates were retrieved.
    pub fn retrieved_at(&self) -> Timestamp {
        self.retrieved_at
    }

    /// All rates, ordered by currency.
    pub fn rates(&self) -> &BTreeMap<CurrencyCode, Decimal> {
        &self.rates_to_base
    }

    /// Raw rate lookup. The base currency is always present.
    pub fn get(&self, currency: CurrencyCode) -> Option<Decimal> {
        self.rates_to_base.get(&currency).copied()
    }

    /// Rate of `currency` in base units.
    ///
    /// The base currency resolves to one even if the mapping lacks it.
    pub fn rate_of(&self, currency: CurrencyCode) -> FxResult<Decimal> {
        match self.get(currency) {
            Some(rate) => Ok(rate),
            None if currency.is_base() => Ok(Decimal::ONE),
            None => Err(FxError::UnknownRate(currency)),
        }
    }

    /// Whether the snapshot is no older than `window` at instant `at`.
    pub fn is_fresh(&self, window: Duration, at: Timestamp) -> bool {
        is_within(self.retrieved_at, window, at)
    }
}
