//! Service contract consumed by front ends.

use async_trait::async_trait;
use calcx_common::CurrencyCode;
use rust_decimal::Decimal;

use crate::cancel::CancellationSignal;
use crate::conversion::ConversionResult;
use crate::engine::FxEngine;
use crate::error::FxResult;
use crate::snapshot::RateSnapshot;

/// Conversion and rate lookup as seen by a presentation layer.
#[async_trait]
pub trait CurrencyService: Send + Sync {
    /// Convert `amount` from one currency to another.
    async fn convert(
        &self,
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
        force_refresh: bool,
        cancel: &CancellationSignal,
    ) -> FxResult<ConversionResult>;

    /// Get the current rate snapshot.
    async fn get_rates(
        &self,
        force_refresh: bool,
        cancel: &CancellationSignal,
    ) -> FxResult<RateSnapshot>;
}

#[async_trait]
impl CurrencyService for FxEngine {
    async fn convert(
        &self,
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
        force_refresh: bool,
        cancel: &CancellationSignal,
    ) -> FxResult<ConversionResult> {
        FxEngine::convert(self, amount, from, to, force_refresh, cancel).await
    }

    async fn get_rates(
        &self,
        force_refresh: bool,
        cancel: &CancellationSignal,
    ) -> FxResult<RateSnapshot> {
        FxEngine::get_rates(self, force_refresh, cancel).await
    }
}
