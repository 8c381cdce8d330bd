use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::errors::CoreError;

const BLOCKCHAIN_API_KEY_ENV: &str = "COINFOLIO_BLOCKCHAIN_API_KEY";

/// Base URLs (and credentials) of the upstream providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub market_data_url: String,
    pub exchange_rate_url: String,
    pub blockchain_url: String,
    pub blockchain_api_key: Option<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            market_data_url: "https://api.coingecko.com/api/v3".to_string(),
            exchange_rate_url: "https://api.exchangerate-api.com/v4".to_string(),
            blockchain_url: "https://deep-index.moralis.io/api/v2.2".to_string(),
            blockchain_api_key: None,
        }
    }
}

/// Tunables for caching, throttling, HTTP and scheduling.
///
/// Every field has a default, so a config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Freshness window of cached price snapshots.
    pub price_ttl_secs: u64,
    /// Freshness window of cached price histories.
    pub history_ttl_secs: u64,
    /// Freshness window of cached exchange rates.
    pub rate_ttl_secs: u64,
    /// Minimum spacing between consecutive price-history calls, system-wide.
    pub history_min_spacing_ms: u64,
    pub request_timeout_secs: u64,
    pub max_redirects: usize,
    pub alert_interval_secs: u64,
    pub providers: ProvidersConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            price_ttl_secs: 60,
            history_ttl_secs: 60,
            rate_ttl_secs: 60 * 60,
            history_min_spacing_ms: 1100,
            request_timeout_secs: 5,
            max_redirects: 5,
            alert_interval_secs: 60,
            providers: ProvidersConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            CoreError::Config(format!("Failed to parse config file {}: {e}", path.display()))
        })?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Fill secrets from the environment when they are not in the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(BLOCKCHAIN_API_KEY_ENV) {
            if !key.is_empty() {
                self.providers.blockchain_api_key = Some(key);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.price_ttl_secs == 0 || self.history_ttl_secs == 0 || self.rate_ttl_secs == 0 {
            return Err(CoreError::Config("Cache TTLs must be greater than zero".into()));
        }
        for (name, secs) in [
            ("price_ttl_secs", self.price_ttl_secs),
            ("history_ttl_secs", self.history_ttl_secs),
            ("rate_ttl_secs", self.rate_ttl_secs),
        ] {
            if ttl_from_secs(secs).is_none() {
                return Err(CoreError::Config(format!("{name} is out of range: {secs}")));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config("Request timeout must be greater than zero".into()));
        }
        if self.alert_interval_secs == 0 {
            return Err(CoreError::Config("Alert interval must be greater than zero".into()));
        }
        Ok(())
    }

    // Unvalidated out-of-range values saturate; `validate` rejects them.
    pub fn price_ttl(&self) -> chrono::Duration {
        ttl_from_secs(self.price_ttl_secs).unwrap_or(chrono::Duration::MAX)
    }

    pub fn history_ttl(&self) -> chrono::Duration {
        ttl_from_secs(self.history_ttl_secs).unwrap_or(chrono::Duration::MAX)
    }

    pub fn rate_ttl(&self) -> chrono::Duration {
        ttl_from_secs(self.rate_ttl_secs).unwrap_or(chrono::Duration::MAX)
    }

    pub fn history_min_spacing(&self) -> Duration {
        Duration::from_millis(self.history_min_spacing_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn alert_interval(&self) -> Duration {
        Duration::from_secs(self.alert_interval_secs)
    }
}

fn ttl_from_secs(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
}
