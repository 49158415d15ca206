//! CalcX FX Engine
//!
//! Currency rates anchored to CLP: remote acquisition, a persistent
//! single-snapshot cache and pivot conversion.
//!
//! # Features
//!
//! - Indicator HTTP rate source with strict completeness checks
//! - JSON file cache replaced atomically, corrupt records read as a miss
//! - Freshness window with explicit forced refresh
//! - Cooperative cancellation of every suspending operation
//!
//! # Example
//!
//! ```rust,ignore
//! use calcx_fx::{CancellationSignal, FxEngine, FxEngineConfig};
//! use calcx_common::CurrencyCode;
//! use rust_decimal_macros::dec;
//!
//! let engine = FxEngine::from_config(FxEngineConfig::from_env())?;
//! let never = CancellationSignal::never();
//!
//! let usd = engine
//!     .convert(dec!(1800), CurrencyCode::Clp, CurrencyCode::Usd, false, &never)
//!     .await?;
//! ```

pub mod engine;
pub mod provider;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod conversion;
pub mod snapshot;
pub mod service;
pub mod error;

pub use engine::FxEngine;
pub use provider::{IndicatorRateSource, RateSource};
pub use cache::{FileRateCache, SnapshotStore};
pub use cancel::{cancellation, CancellationHandle, CancellationSignal};
pub use config::FxEngineConfig;
pub use conversion::{ConversionResult, ReferenceRate};
pub use snapshot::RateSnapshot;
pub use service::CurrencyService;
pub use error::{FxError, FxResult};

#[cfg(any(test, feature = "test-utils"))]
pub use cache::MemorySnapshotStore;
#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateSource;
