//! Dashboard configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub live: LiveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend entry point; every call is `{base_url}?action=<name>`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Quiet period before a query change triggers a reset
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Fraction of the sentinel that must be visible to load more
    #[serde(default = "default_sentinel_threshold")]
    pub sentinel_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Whole-set refresh period for live views
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// How long the refresh indicator stays up after a refresh completes
    #[serde(default = "default_indicator_linger")]
    pub indicator_linger_ms: u64,
}

// Defaults
fn default_base_url() -> String { "https://testzone.cvx-r.cl/backend/backend.php".to_string() }
fn default_timeout_secs() -> u64 { 10 }
fn default_page_size() -> u32 { 10 }
fn default_debounce_ms() -> u64 { 400 }
fn default_sentinel_threshold() -> f64 { 0.1 }
fn default_refresh_interval() -> u64 { 60 }
fn default_indicator_linger() -> u64 { 2000 }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            sentinel_threshold: default_sentinel_threshold(),
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            indicator_linger_ms: default_indicator_linger(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ListConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl LiveConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn indicator_linger(&self) -> Duration {
        Duration::from_millis(self.indicator_linger_ms)
    }
}

impl DashboardConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DashboardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            DashboardError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(DashboardError::Config("api.base_url must not be empty".into()));
        }
        if self.list.page_size == 0 {
            return Err(DashboardError::Config("list.page_size must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.list.sentinel_threshold) {
            return Err(DashboardError::Config(
                "list.sentinel_threshold must be within 0.0..=1.0".into(),
            ));
        }
        if self.live.refresh_interval_secs == 0 {
            return Err(DashboardError::Config(
                "live.refresh_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}
