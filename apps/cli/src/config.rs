//! YAML configuration for the command-line front end.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "zakat.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the snapshot and price cache files.
    pub storage_dir: PathBuf,
    /// Spot price endpoint.
    pub price_source_url: String,
    /// Transport timeout for the price lookup; none by default.
    pub request_timeout_secs: Option<u64>,
    /// Never touch the network.
    pub offline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(persistence::default_storage_dir()),
            price_source_url: price_feed::DEFAULT_SOURCE_URL.to_string(),
            request_timeout_secs: None,
            offline: false,
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("invalid configuration")
    }

    /// Explicit path must exist; otherwise fall back to `zakat.yaml`, then
    /// to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !p.exists() {
                    return Ok(Self::default());
                }
                p
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
