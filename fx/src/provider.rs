//! Rate source trait and implementations.

use std::time::Duration;

use async_trait::async_trait;
use calcx_common::{now, CurrencyCode, Timestamp};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{FxError, FxResult};
use crate::snapshot::RateSnapshot;

/// Default endpoint of the indicator service.
pub const DEFAULT_ENDPOINT: &str = "https://mindicador.cl/api";

/// Trait for remote rate sources.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch the current rates. Single attempt, no retry.
    async fn fetch(&self) -> FxResult<RateSnapshot>;
}

/// Indicator service response. Only the fields we price from are decoded.
#[derive(Debug, Deserialize)]
pub struct IndicatorResponse {
    #[serde(default)]
    pub fecha: Option<Timestamp>,
    #[serde(default)]
    pub uf: Option<Indicator>,
    #[serde(default)]
    pub dolar: Option<Indicator>,
    #[serde(default)]
    pub euro: Option<Indicator>,
}

/// A single named indicator.
#[derive(Debug, Deserialize)]
pub struct Indicator {
    pub valor: Decimal,
}

impl IndicatorResponse {
    /// Indicator key carrying the rate of `currency`.
    pub fn indicator_name(currency: CurrencyCode) -> Option<&'static str> {
        match currency {
            CurrencyCode::Clp => None,
            CurrencyCode::Uf => Some("uf"),
            CurrencyCode::Usd => Some("dolar"),
            CurrencyCode::Eur => Some("euro"),
        }
    }

    fn indicator(&self, currency: CurrencyCode) -> Option<&Indicator> {
        match currency {
            CurrencyCode::Clp => None,
            CurrencyCode::Uf => self.uf.as_ref(),
            CurrencyCode::Usd => self.dolar.as_ref(),
            CurrencyCode::Eur => self.euro.as_ref(),
        }
    }

    /// Build a snapshot, failing if any quoted currency is missing.
    pub fn into_snapshot(self) -> FxResult<RateSnapshot> {
        let mut rates = Vec::new();

        for currency in CurrencyCode::quoted() {
            let indicator = self.indicator(currency).ok_or_else(|| {
                let name = Self::indicator_name(currency).unwrap_or(currency.code());
                FxError::IncompleteRateData(name.to_string())
            })?;
            rates.push((currency, indicator.valor));
        }

        RateSnapshot::new(self.fecha.unwrap_or_else(now), rates)
    }
}

/// Rate source backed by the indicator HTTP API.
pub struct IndicatorRateSource {
    client: Client,
    endpoint: String,
}

impl IndicatorRateSource {
    /// Create a source for `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> FxResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl RateSource for IndicatorRateSource {
    fn name(&self) -> &str {
        "MINDICADOR"
    }

    async fn fetch(&self) -> FxResult<RateSnapshot> {
        debug!(endpoint = %self.endpoint, "Requesting rates");

        let response = self.client.get(&self.endpoint).send().await?;

        if !response.status().is_success() {
            return Err(FxError::RemoteFetchFailure(format!(
                "{} returned status {}",
                self.endpoint,
                response.status()
            )));
        }

        let body: IndicatorResponse = response.json().await?;
        let snapshot = body.into_snapshot()?;

        info!(
            source = self.name(),
            retrieved_at = %snapshot.retrieved_at(),
            rates = snapshot.rates().len(),
            "Fetched rates"
        );

        Ok(snapshot)
    }
}

/// Mock rate source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateSource {
    name: String,
    rates: parking_lot::Mutex<Vec<(CurrencyCode, Decimal)>>,
    retrieved_at: parking_lot::Mutex<Option<Timestamp>>,
    failure: parking_lot::Mutex<Option<FxError>>,
    latency: parking_lot::Mutex<Option<Duration>>,
    fetches: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateSource {
    /// Create a new mock source with no rates.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: parking_lot::Mutex::new(Vec::new()),
            retrieved_at: parking_lot::Mutex::new(None),
            failure: parking_lot::Mutex::new(None),
            latency: parking_lot::Mutex::new(None),
            fetches: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Set the rate of a currency.
    pub fn set_rate(&self, currency: CurrencyCode, rate: Decimal) {
        let mut rates = self.rates.lock();
        rates.retain(|(c, _)| *c != currency);
        rates.push((currency, rate));
    }

    /// Pin the retrieval timestamp. Unpinned fetches are stamped with now.
    pub fn set_retrieved_at(&self, at: Option<Timestamp>) {
        *self.retrieved_at.lock() = at;
    }

    /// Make every fetch fail with `error`, or succeed again with `None`.
    pub fn set_failure(&self, error: Option<FxError>) {
        *self.failure.lock() = error;
    }

    /// Delay every fetch.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Number of fetches started.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateSource for MockRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> FxResult<RateSnapshot> {
        self.fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self.failure.lock().clone();
        if let Some(error) = failure {
            return Err(error);
        }

        let retrieved_at = (*self.retrieved_at.lock()).unwrap_or_else(now);
        let rates = self.rates.lock().clone();
        RateSnapshot::new(retrieved_at, rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    const FULL_BODY: &str = r#"{
        "version": "1.7.0",
        "autor": "mindicador.cl",
        "fecha": "2024-05-10T04:00:00.000Z",
        "uf": {"codigo": "uf", "nombre": "Unidad de fomento (UF)", "unidad_medida": "Pesos", "fecha": "2024-05-10T04:00:00.000Z", "valor": 37245.12},
        "dolar": {"codigo": "dolar", "nombre": "Dólar observado", "unidad_medida": "Pesos", "fecha": "2024-05-10T04:00:00.000Z", "valor": 925.55},
        "euro": {"codigo": "euro", "nombre": "Euro", "unidad_medida": "Pesos", "fecha": "2024-05-10T04:00:00.000Z", "valor": 996.74},
        "utm": {"codigo": "utm", "valor": 65443}
    }"#;

    #[test]
    fn test_decode_full_response() {
        let response: IndicatorResponse = serde_json::from_str(FULL_BODY).unwrap();
        let snapshot = response.into_snapshot().unwrap();

        assert_eq!(
            snapshot.retrieved_at(),
            chrono::Utc.with_ymd_and_hms(2024, 5, 10, 4, 0, 0).unwrap()
        );
        assert_eq!(snapshot.get(CurrencyCode::Clp), Some(Decimal::ONE));
        assert_eq!(snapshot.get(CurrencyCode::Uf), Some(dec!(37245.12)));
        assert_eq!(snapshot.get(CurrencyCode::Usd), Some(dec!(925.55)));
        assert_eq!(snapshot.get(CurrencyCode::Eur), Some(dec!(996.74)));
    }

    #[test]
    fn test_missing_indicator_is_incomplete() {
        let indicators = [
            ("uf", r#""uf": {"valor": 37245.12}"#),
            ("dolar", r#""dolar": {"valor": 925.55}"#),
            ("euro", r#""euro": {"valor": 996.74}"#),
        ];

        for (missing, _) in indicators {
            let fields: Vec<_> = indicators
                .iter()
                .filter(|(name, _)| *name != missing)
                .map(|(_, field)| *field)
                .collect();
            let body = format!(
                r#"{{"fecha": "2024-05-10T04:00:00.000Z", {}}}"#,
                fields.join(", ")
            );
            let response: IndicatorResponse = serde_json::from_str(&body).unwrap();

            assert_eq!(
                response.into_snapshot(),
                Err(FxError::IncompleteRateData(missing.to_string()))
            );
        }
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let body = r#"{
            "uf": {"valor": 37245.12},
            "dolar": {"valor": 925.55},
            "euro": {"valor": 996.74}
        }"#;
        let before = now();
        let response: IndicatorResponse = serde_json::from_str(body).unwrap();
        let snapshot = response.into_snapshot().unwrap();

        assert!(snapshot.retrieved_at() >= before);
        assert!(snapshot.retrieved_at() <= now());
    }

    #[test]
    fn test_non_positive_indicator_rejected() {
        let body = r#"{
            "uf": {"valor": 37245.12},
            "dolar": {"valor": 0},
            "euro": {"valor": 996.74}
        }"#;
        let response: IndicatorResponse = serde_json::from_str(body).unwrap();

        assert!(matches!(
            response.into_snapshot(),
            Err(FxError::InvalidRateValue {
                currency: CurrencyCode::Usd,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_mock_source() {
        let source = MockRateSource::new("test");
        source.set_rate(CurrencyCode::Usd, dec!(900));

        let snapshot = source.fetch().await.unwrap();
        assert_eq!(snapshot.get(CurrencyCode::Usd), Some(dec!(900)));
        assert_eq!(source.fetch_count(), 1);

        source.set_failure(Some(FxError::RemoteFetchFailure("down".into())));
        assert!(source.fetch().await.is_err());
        assert_eq!(source.fetch_count(), 2);
    }
}
