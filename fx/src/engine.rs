//! Main FX engine implementation.

use std::sync::Arc;

use calcx_common::{now, CurrencyCode};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::cache::{FileRateCache, SnapshotStore};
use crate::cancel::CancellationSignal;
use crate::config::FxEngineConfig;
use crate::conversion::ConversionResult;
use crate::error::{FxError, FxResult};
use crate::provider::{IndicatorRateSource, RateSource};
use crate::snapshot::RateSnapshot;

/// The main FX engine.
///
/// Holds no rate state of its own: every call reads the store and, when the
/// stored snapshot is missing or stale, fetches and replaces it. Concurrent
/// refreshes are not coalesced; each fetches and the last save wins.
pub struct FxEngine {
    source: Arc<dyn RateSource>,
    store: Arc<dyn SnapshotStore>,
    config: FxEngineConfig,
}

impl FxEngine {
    /// Create a new FX engine with the given source and store.
    pub fn new(
        source: Arc<dyn RateSource>,
        store: Arc<dyn SnapshotStore>,
        config: FxEngineConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Create an engine wired to the indicator service and the file cache.
    pub fn from_config(config: FxEngineConfig) -> FxResult<Self> {
        let source = IndicatorRateSource::new(config.endpoint.clone(), config.request_timeout)?;
        let store = FileRateCache::new(config.cache_path.clone());
        Ok(Self::new(Arc::new(source), Arc::new(store), config))
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &FxEngineConfig {
        &self.config
    }

    /// Get the current rates, from cache when fresh enough.
    #[instrument(skip(self, cancel))]
    pub async fn get_rates(
        &self,
        force_refresh: bool,
        cancel: &CancellationSignal,
    ) -> FxResult<RateSnapshot> {
        if !force_refresh {
            let cached = cancel
                .run(async { Ok::<_, FxError>(self.store.load().await) })
                .await?;

            match cached {
                Some(snapshot) if snapshot.is_fresh(self.config.freshness_window, now()) => {
                    debug!(retrieved_at = %snapshot.retrieved_at(), "Using cached rates");
                    return Ok(snapshot);
                }
                Some(snapshot) => {
                    debug!(retrieved_at = %snapshot.retrieved_at(), "Cached rates are stale");
                }
                None => debug!("Cache miss"),
            }
        }

        let fetched = cancel.run(self.source.fetch()).await?;

        // A cancelled call must not leave a write behind.
        cancel.check()?;

        if let Err(e) = self.store.save(&fetched).await {
            warn!(error = %e, "Could not persist rates, using fetched snapshot anyway");
        }

        info!(
            source = self.source.name(),
            retrieved_at = %fetched.retrieved_at(),
            "Rates refreshed"
        );

        Ok(fetched)
    }

    /// Convert an amount between two currencies.
    #[instrument(skip(self, cancel))]
    pub async fn convert(
        &self,
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
        force_refresh: bool,
        cancel: &CancellationSignal,
    ) -> FxResult<ConversionResult> {
        if amount <= Decimal::ZERO {
            return Err(FxError::InvalidAmount(amount));
        }

        let snapshot = self.get_rates(force_refresh, cancel).await?;
        let result = ConversionResult::price(&snapshot, amount, from, to)?;

        info!(
            target_amount = %result.target_amount,
            as_of = %result.as_of,
            "Conversion completed"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemorySnapshotStore;
    use crate::cancel::cancellation;
    use crate::provider::MockRateSource;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use std::time::Duration as StdDuration;

    fn make_source() -> Arc<MockRateSource> {
        let source = Arc::new(MockRateSource::new("test"));
        source.set_rate(CurrencyCode::Uf, dec!(37000));
        source.set_rate(CurrencyCode::Usd, dec!(900));
        source.set_rate(CurrencyCode::Eur, dec!(1000));
        source
    }

    fn setup_engine() -> (FxEngine, Arc<MockRateSource>, Arc<MemorySnapshotStore>) {
        setup_with(MemorySnapshotStore::new(), FxEngineConfig::default())
    }

    fn setup_with(
        store: MemorySnapshotStore,
        config: FxEngineConfig,
    ) -> (FxEngine, Arc<MockRateSource>, Arc<MemorySnapshotStore>) {
        let source = make_source();
        let store = Arc::new(store);
        let engine = FxEngine::new(source.clone(), store.clone(), config);
        (engine, source, store)
    }

    #[tokio::test]
    async fn test_fetches_once_within_window() {
        let (engine, source, store) = setup_engine();
        let never = CancellationSignal::never();

        let first = engine.get_rates(false, &never).await.unwrap();
        let second = engine.get_rates(false, &never).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_refetches_after_window() {
        let config = FxEngineConfig {
            freshness_window: Duration::milliseconds(200),
            ..Default::default()
        };
        let (engine, source, _store) = setup_with(MemorySnapshotStore::new(), config);
        let never = CancellationSignal::never();

        engine.get_rates(false, &never).await.unwrap();
        engine.get_rates(false, &never).await.unwrap();
        assert_eq!(source.fetch_count(), 1);

        tokio::time::sleep(StdDuration::from_millis(250)).await;

        engine.get_rates(false, &never).await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_fetch() {
        let cached =
            RateSnapshot::new(now() - Duration::minutes(5), [(CurrencyCode::Usd, dec!(880))])
                .unwrap();
        let (engine, source, _store) = setup_with(
            MemorySnapshotStore::with_snapshot(cached.clone()),
            FxEngineConfig::default(),
        );

        let rates = engine
            .get_rates(false, &CancellationSignal::never())
            .await
            .unwrap();

        assert_eq!(rates, cached);
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_is_refreshed() {
        let stale =
            RateSnapshot::new(now() - Duration::hours(2), [(CurrencyCode::Usd, dec!(880))])
                .unwrap();
        let (engine, source, store) = setup_with(
            MemorySnapshotStore::with_snapshot(stale),
            FxEngineConfig::default(),
        );

        let rates = engine
            .get_rates(false, &CancellationSignal::never())
            .await
            .unwrap();

        assert_eq!(rates.get(CurrencyCode::Usd), Some(dec!(900)));
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(store.current(), Some(rates));
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_fresh_cache() {
        let cached = RateSnapshot::new(now(), [(CurrencyCode::Usd, dec!(880))]).unwrap();
        let (engine, source, _store) = setup_with(
            MemorySnapshotStore::with_snapshot(cached),
            FxEngineConfig::default(),
        );

        let rates = engine
            .get_rates(true, &CancellationSignal::never())
            .await
            .unwrap();

        assert_eq!(rates.get(CurrencyCode::Usd), Some(dec!(900)));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_persist_failure_is_swallowed() {
        let (engine, source, store) = setup_engine();
        store.fail_saves(true);

        let rates = tokio_test::assert_ok!(
            engine
                .get_rates(false, &CancellationSignal::never())
                .await
        );

        assert_eq!(rates.get(CurrencyCode::Eur), Some(dec!(1000)));
        assert_eq!(source.fetch_count(), 1);
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let (engine, source, store) = setup_engine();
        source.set_failure(Some(FxError::RemoteFetchFailure("timeout".into())));

        let result = engine.get_rates(false, &CancellationSignal::never()).await;

        assert_eq!(result, Err(FxError::RemoteFetchFailure("timeout".into())));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_incomplete_data_propagates() {
        let (engine, source, store) = setup_engine();
        source.set_failure(Some(FxError::IncompleteRateData("euro".into())));

        let result = engine.get_rates(true, &CancellationSignal::never()).await;

        assert_eq!(result, Err(FxError::IncompleteRateData("euro".into())));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_convert_scenarios() {
        let (engine, _source, _store) = setup_engine();
        let never = CancellationSignal::never();

        let to_usd = engine
            .convert(dec!(1800), CurrencyCode::Clp, CurrencyCode::Usd, false, &never)
            .await
            .unwrap();
        assert_eq!(to_usd.target_amount, dec!(2.0000));

        let to_clp = engine
            .convert(dec!(10), CurrencyCode::Usd, CurrencyCode::Clp, false, &never)
            .await
            .unwrap();
        assert_eq!(to_clp.target_amount, dec!(9000.0000));

        let eur_to_usd = engine
            .convert(dec!(9), CurrencyCode::Eur, CurrencyCode::Usd, false, &never)
            .await
            .unwrap();
        assert_eq!(eur_to_usd.target_amount, dec!(10));
    }

    #[tokio::test]
    async fn test_convert_identity() {
        let (engine, _source, _store) = setup_engine();
        let never = CancellationSignal::never();

        for currency in CurrencyCode::ALL {
            let result = engine
                .convert(dec!(1234.5678), currency, currency, false, &never)
                .await
                .unwrap();
            assert_eq!(result.target_amount, dec!(1234.5678));
        }
    }

    #[tokio::test]
    async fn test_convert_invalid_amount() {
        let (engine, source, _store) = setup_engine();
        let never = CancellationSignal::never();

        for amount in [dec!(0), dec!(-5)] {
            let result = engine
                .convert(amount, CurrencyCode::Clp, CurrencyCode::Usd, false, &never)
                .await;
            assert_eq!(result, Err(FxError::InvalidAmount(amount)));
        }
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_convert_amount_too_large() {
        let (engine, source, _store) = setup_engine();
        let amount = dec!(10000000000000000000000000);

        let result = engine
            .convert(
                amount,
                CurrencyCode::Uf,
                CurrencyCode::Clp,
                false,
                &CancellationSignal::never(),
            )
            .await;

        assert_eq!(result, Err(FxError::InvalidAmount(amount)));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_convert_unknown_rate() {
        let cached = RateSnapshot::new(now(), [(CurrencyCode::Usd, dec!(900))]).unwrap();
        let (engine, _source, _store) = setup_with(
            MemorySnapshotStore::with_snapshot(cached),
            FxEngineConfig::default(),
        );

        let result = engine
            .convert(
                dec!(1),
                CurrencyCode::Usd,
                CurrencyCode::Eur,
                false,
                &CancellationSignal::never(),
            )
            .await;

        assert_eq!(result, Err(FxError::UnknownRate(CurrencyCode::Eur)));
    }

    #[tokio::test]
    async fn test_as_of_is_snapshot_time() {
        let (engine, source, _store) = setup_engine();
        let retrieved_at = now() - Duration::minutes(10);
        source.set_retrieved_at(Some(retrieved_at));

        let result = engine
            .convert(
                dec!(100),
                CurrencyCode::Uf,
                CurrencyCode::Clp,
                false,
                &CancellationSignal::never(),
            )
            .await
            .unwrap();

        assert_eq!(result.as_of, retrieved_at);
        assert_eq!(result.target_amount, dec!(3700000));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (engine, source, store) = setup_engine();
        let (handle, signal) = cancellation();
        handle.cancel();

        let result = engine.get_rates(true, &signal).await;

        assert_eq!(result, Err(FxError::Cancelled));
        assert_eq!(source.fetch_count(), 0);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_during_fetch_writes_nothing() {
        let (engine, source, store) = setup_engine();
        source.set_latency(Some(StdDuration::from_secs(30)));
        let engine = Arc::new(engine);
        let (handle, signal) = cancellation();

        let task = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.get_rates(false, &signal).await })
        };

        tokio::time::sleep(StdDuration::from_millis(50)).await;
        handle.cancel();

        assert_eq!(task.await.unwrap(), Err(FxError::Cancelled));
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(store.save_count(), 0);
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_forced_refreshes_each_fetch() {
        let (engine, source, store) = setup_engine();
        let never = CancellationSignal::never();

        let (a, b) = tokio::join!(engine.get_rates(true, &never), engine.get_rates(true, &never));

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(store.save_count(), 2);
    }
}
