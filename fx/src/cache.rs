//! Persistent single-slot rate cache.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calcx_common::{CurrencyCode, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{FxError, FxResult};
use crate::snapshot::RateSnapshot;

/// Durable store holding the most recent snapshot only.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the stored snapshot. Missing or undecodable records are `None`.
    async fn load(&self) -> Option<RateSnapshot>;

    /// Replace the stored snapshot as a whole.
    async fn save(&self, snapshot: &RateSnapshot) -> FxResult<()>;
}

/// On-disk record layout.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheRecord {
    retrieved_at: Timestamp,
    rates: BTreeMap<CurrencyCode, Decimal>,
}

impl From<&RateSnapshot> for CacheRecord {
    fn from(snapshot: &RateSnapshot) -> Self {
        Self {
            retrieved_at: snapshot.retrieved_at(),
            rates: snapshot.rates().clone(),
        }
    }
}

impl CacheRecord {
    fn decode(bytes: &[u8]) -> FxResult<RateSnapshot> {
        let record: CacheRecord = serde_json::from_slice(bytes)
            .map_err(|e| FxError::CacheDecodeFailure(e.to_string()))?;
        RateSnapshot::new(record.retrieved_at, record.rates)
            .map_err(|e| FxError::CacheDecodeFailure(e.to_string()))
    }
}

/// JSON file store.
///
/// Writes go to a uniquely named sibling file which is then renamed over the
/// target, so a reader sees either the previous record or the new one.
#[derive(Debug, Clone)]
pub struct FileRateCache {
    path: PathBuf,
}

impl FileRateCache {
    /// Create a store backed by `path`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "rate-cache".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
    }

    async fn write_and_replace(&self, temp: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::File::create(temp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(temp, &self.path).await
    }
}

#[async_trait]
impl SnapshotStore for FileRateCache {
    async fn load(&self) -> Option<RateSnapshot> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No cached rates");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read rate cache");
                return None;
            }
        };

        match CacheRecord::decode(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable rate cache");
                None
            }
        }
    }

    async fn save(&self, snapshot: &RateSnapshot) -> FxResult<()> {
        let bytes = serde_json::to_vec_pretty(&CacheRecord::from(snapshot))
            .map_err(|e| FxError::CachePersistFailure(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FxError::CachePersistFailure(e.to_string()))?;
        }

        let temp = self.temp_path();
        if let Err(e) = self.write_and_replace(&temp, &bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(FxError::CachePersistFailure(e.to_string()));
        }

        debug!(
            path = %self.path.display(),
            retrieved_at = %snapshot.retrieved_at(),
            "Saved rate cache"
        );
        Ok(())
    }
}

/// In-memory store for testing.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct MemorySnapshotStore {
    slot: parking_lot::Mutex<Option<RateSnapshot>>,
    fail_saves: std::sync::atomic::AtomicBool,
    saves: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MemorySnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `snapshot`.
    pub fn with_snapshot(snapshot: RateSnapshot) -> Self {
        let store = Self::default();
        *store.slot.lock() = Some(snapshot);
        store
    }

    /// Make subsequent saves fail.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Current slot content.
    pub fn current(&self) -> Option<RateSnapshot> {
        self.slot.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Option<RateSnapshot> {
        self.slot.lock().clone()
    }

    async fn save(&self, snapshot: &RateSnapshot) -> FxResult<()> {
        if self.fail_saves.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(FxError::CachePersistFailure("store unavailable".into()));
        }
        *self.slot.lock() = Some(snapshot.clone());
        self.saves
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
