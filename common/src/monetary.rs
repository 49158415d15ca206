//! Monetary types for CalcX.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CommonError;

/// Fractional digits kept on tax and retention amounts.
pub const MONEY_DECIMALS: u32 = 2;

/// Fractional digits kept on converted amounts and displayed rates.
pub const CONVERSION_DECIMALS: u32 = 4;

/// Supported currencies.
///
/// `CLP` is the base currency: every rate is quoted in CLP and the CLP rate
/// is exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CurrencyCode {
    /// Chilean peso (base).
    #[serde(rename = "CLP")]
    Clp,
    /// Unidad de Fomento.
    #[serde(rename = "UF")]
    Uf,
    /// US dollar.
    #[serde(rename = "USD")]
    Usd,
    /// Euro.
    #[serde(rename = "EUR")]
    Eur,
}

impl CurrencyCode {
    /// The base currency all rates are expressed in.
    pub const BASE: CurrencyCode = CurrencyCode::Clp;

    /// Every supported currency, base first.
    pub const ALL: [CurrencyCode; 4] = [
        CurrencyCode::Clp,
        CurrencyCode::Uf,
        CurrencyCode::Usd,
        CurrencyCode::Eur,
    ];

    /// Get the currency code.
    pub fn code(&self) -> &'static str {
        match self {
            CurrencyCode::Clp => "CLP",
            CurrencyCode::Uf => "UF",
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
        }
    }

    /// Whether this is the base currency.
    pub fn is_base(&self) -> bool {
        *self == Self::BASE
    }

    /// Currencies that need a quoted rate against the base.
    pub fn quoted() -> impl Iterator<Item = CurrencyCode> {
        Self::ALL.into_iter().filter(|c| !c.is_base())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CommonError::UnknownCurrency(s.to_string()))
    }
}

/// Round half away from zero to `places` fractional digits.
pub fn round_half_away(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a tax or retention amount.
pub fn round_money(value: Decimal) -> Decimal {
    round_half_away(value, MONEY_DECIMALS)
}

/// Round a converted amount.
pub fn round_conversion(value: Decimal) -> Decimal {
    round_half_away(value, CONVERSION_DECIMALS)
}
