//! Tunable limits and timings.
//!
//! Every field has a default, so a config file only needs the keys it
//! wants to change:
//!
//! ```
//! use touchfish::ReaderConfig;
//!
//! let config = ReaderConfig::from_json_str(r#"{ "bridge": { "maxLoadAttempts": 5 } }"#).unwrap();
//! assert_eq!(config.bridge.max_load_attempts, 5);
//! assert_eq!(config.paging.min_page_size, 100);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 100 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReaderConfig {
    pub admission: AdmissionConfig,
    pub paging: PagingConfig,
    pub bridge: BridgeConfig,
}

/// Which files may enter the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdmissionConfig {
    pub max_input_bytes: u64,
    /// Lowercase, without the leading dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            allowed_extensions: vec!["txt".into(), "epub".into(), "pdf".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PagingConfig {
    /// Floor applied to the page size derived from a selection.
    pub min_page_size: usize,
    /// Page size used before any host has been selected.
    pub default_page_size: usize,
    /// Text selections must be longer than this to pick a host.
    pub min_selection_chars: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            min_page_size: 100,
            default_page_size: 200,
            min_selection_chars: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    pub max_load_attempts: u32,
    /// Attempt `n` waits `n * backoff_step_ms` before attempt `n + 1`.
    pub backoff_step_ms: u64,
    /// Wait after injecting the page agent.
    pub settle_delay_ms: u64,
    /// A ping with no reply within this long counts as no receiver.
    pub ping_timeout_ms: u64,
    /// Address prefixes the page agent can never run on.
    pub blocked_schemes: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_load_attempts: 3,
            backoff_step_ms: 500,
            settle_delay_ms: 500,
            ping_timeout_ms: 1000,
            blocked_schemes: [
                "chrome://",
                "chrome-extension://",
                "moz-extension://",
                "edge://",
                "about:",
                "file://",
                "data:",
                "javascript:",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl BridgeConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_step_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}

impl ReaderConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ReaderConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<()> {
        if self.paging.min_page_size == 0 || self.paging.default_page_size == 0 {
            return Err(Error::Config("page sizes must be at least 1".into()));
        }
        if self.bridge.max_load_attempts == 0 {
            return Err(Error::Config("maxLoadAttempts must be at least 1".into()));
        }
        Ok(())
    }
}
