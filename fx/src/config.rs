//! FX engine configuration.

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use calcx_common::constants;
use calcx_common::DurationExt;
use chrono::Duration;

use crate::provider::DEFAULT_ENDPOINT;

/// Application directory under the per-user data directory.
pub const APP_DIR_NAME: &str = "CalculadoraX";

/// Cache file name inside [`APP_DIR_NAME`].
pub const CACHE_FILE_NAME: &str = "currency-cache.json";

/// Configuration for the FX engine.
#[derive(Debug, Clone)]
pub struct FxEngineConfig {
    /// Indicator service URL.
    pub endpoint: String,
    /// Location of the persisted snapshot.
    pub cache_path: PathBuf,
    /// Maximum age of a cached snapshot before it is refreshed.
    pub freshness_window: Duration,
    /// Timeout for a single remote request.
    pub request_timeout: StdDuration,
}

impl Default for FxEngineConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl FxEngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            cache_path: default_cache_path(&lookup),
            freshness_window: constants::rate_freshness_window(),
            request_timeout: constants::rate_request_timeout().as_std(),
        };

        if let Some(endpoint) = lookup("CALCX_RATES_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Some(path) = lookup("CALCX_CACHE_PATH").filter(|p| !p.is_empty()) {
            config.cache_path = PathBuf::from(path);
        }

        if let Some(secs) = lookup("CALCX_FRESHNESS_SECS") {
            if let Some(window) = secs.parse::<i64>().ok().and_then(Duration::try_seconds) {
                config.freshness_window = window;
            }
        }

        if let Some(secs) = lookup("CALCX_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.request_timeout = StdDuration::from_secs(secs);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("Rates endpoint cannot be empty".to_string());
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(format!("Rates endpoint must be an http(s) URL: {}", self.endpoint));
        }

        if self.cache_path.file_name().is_none() {
            return Err("Cache path must name a file".to_string());
        }

        if self.freshness_window < Duration::zero() {
            return Err("Freshness window cannot be negative".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }

        Ok(())
    }
}

/// Per-user cache location: the first set of `CALCX_DATA_DIR`, `APPDATA`,
/// `XDG_DATA_HOME`, `$HOME/.local/share`, else the temp directory.
fn default_cache_path<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let base = ["CALCX_DATA_DIR", "APPDATA", "XDG_DATA_HOME"]
        .iter()
        .find_map(|key| lookup(key).filter(|v| !v.is_empty()))
        .map(PathBuf::from)
        .or_else(|| {
            lookup("HOME")
                .filter(|v| !v.is_empty())
                .map(|home| PathBuf::from(home).join(".local").join("share"))
        })
        .unwrap_or_else(std::env::temp_dir);

    base.join(APP_DIR_NAME).join(CACHE_FILE_NAME)
}
