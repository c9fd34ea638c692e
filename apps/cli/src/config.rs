//! CLI configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::Path;

use anyhow::{Context, Result};
use interlude_core::protocol_constants::{
    DEFAULT_DURATION_ADJUSTMENT_MS, DEFAULT_SETTLE_DELAY_MS, SOAP_TIMEOUT_SECS,
};
use serde::Deserialize;

/// CLI configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Any reachable player, used to read the household topology.
    /// Override: `INTERLUDE_PLAYER` (via `--player`)
    pub player: Option<String>,

    /// Pause between loading content and seeking into it (milliseconds).
    /// Override: `INTERLUDE_SETTLE_DELAY_MS`
    pub settle_delay_ms: u64,

    /// Added to a reported track duration before reverting a notification
    /// (milliseconds).
    /// Override: `INTERLUDE_DURATION_ADJUSTMENT_MS`
    pub duration_adjustment_ms: u64,

    /// Timeout for each SOAP request (seconds).
    /// Override: `INTERLUDE_SOAP_TIMEOUT_SECS`
    pub soap_timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            player: None,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            duration_adjustment_ms: DEFAULT_DURATION_ADJUSTMENT_MS,
            soap_timeout_secs: SOAP_TIMEOUT_SECS,
        }
    }
}

impl CliConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("INTERLUDE_SETTLE_DELAY_MS") {
            if let Ok(ms) = val.parse() {
                self.settle_delay_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("INTERLUDE_DURATION_ADJUSTMENT_MS") {
            if let Ok(ms) = val.parse() {
                self.duration_adjustment_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("INTERLUDE_SOAP_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.soap_timeout_secs = secs;
            }
        }

        // INTERLUDE_PLAYER is handled by clap via #[arg(env = ...)] in main.rs
    }

    /// Converts to interlude-core's Config type.
    pub fn to_core_config(&self) -> interlude_core::Config {
        interlude_core::Config {
            settle_delay_ms: self.settle_delay_ms,
            duration_adjustment_ms: self.duration_adjustment_ms,
            soap_timeout_secs: self.soap_timeout_secs,
        }
    }
}
