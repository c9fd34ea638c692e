//! Orchestration configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol_constants::{
    DEFAULT_DURATION_ADJUSTMENT_MS, DEFAULT_SETTLE_DELAY_MS, SOAP_TIMEOUT_SECS,
};

/// Tunables shared by the snapshot, restore and notification flows.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Pause between loading content and each seek (milliseconds).
    pub settle_delay_ms: u64,

    /// Added to a player-reported track duration when deriving how long a
    /// notification plays (milliseconds).
    pub duration_adjustment_ms: u64,

    /// Timeout applied to every SOAP request (seconds).
    pub soap_timeout_secs: u64,
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.soap_timeout_secs == 0 {
            return Err("soap_timeout_secs must be >= 1".to_string());
        }
        if self.settle_delay_ms > 10_000 {
            return Err("settle_delay_ms must be <= 10000".to_string());
        }
        if self.duration_adjustment_ms > 60_000 {
            return Err("duration_adjustment_ms must be <= 60000".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub fn duration_adjustment(&self) -> Duration {
        Duration::from_millis(self.duration_adjustment_ms)
    }

    #[must_use]
    pub fn soap_timeout(&self) -> Duration {
        Duration::from_secs(self.soap_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            duration_adjustment_ms: DEFAULT_DURATION_ADJUSTMENT_MS,
            soap_timeout_secs: SOAP_TIMEOUT_SECS,
        }
    }
}
