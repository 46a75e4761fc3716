//! Configuration types.
//!
//! - `RulesConfig`: table rules the engine enforces (hand size, declaration
//!   window, penalty size, player bounds)
//! - `SyncConfig`: coordinator timing (submit timeout, poll and sweep
//!   intervals), overridable from the environment
//! - `DriverConfig`: automated player pacing
//!
//! All durations are stored as milliseconds so configs serialize cleanly.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rules the engine enforces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Cards dealt to each player.
    pub hand_size: usize,

    /// Time a player has to declare their last card.
    pub declaration_window_ms: u64,

    /// Cards drawn for a missed declaration.
    pub declaration_penalty: usize,

    /// Inclusive player bounds.
    pub min_players: usize,
    pub max_players: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            hand_size: 7,
            declaration_window_ms: 3_000,
            declaration_penalty: 2,
            min_players: 2,
            max_players: 10,
        }
    }
}

impl RulesConfig {
    #[must_use]
    pub fn with_hand_size(mut self, size: usize) -> Self {
        self.hand_size = size;
        self
    }

    #[must_use]
    pub fn with_declaration_window(mut self, window: Duration) -> Self {
        self.declaration_window_ms = window.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn with_declaration_penalty(mut self, cards: usize) -> Self {
        self.declaration_penalty = cards;
        self
    }
}

/// Environment variable overriding `SyncConfig::submit_timeout_ms`.
pub const ENV_SUBMIT_TIMEOUT_MS: &str = "UNO_SYNC_SUBMIT_TIMEOUT_MS";
/// Environment variable overriding `SyncConfig::poll_interval_ms`.
pub const ENV_POLL_INTERVAL_MS: &str = "UNO_SYNC_POLL_INTERVAL_MS";
/// Environment variable overriding `SyncConfig::sweep_interval_ms`.
pub const ENV_SWEEP_INTERVAL_MS: &str = "UNO_SYNC_SWEEP_INTERVAL_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer number of milliseconds, got {value:?}")]
    InvalidMillis { var: &'static str, value: String },
}

/// Coordinator timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How long a peer waits for the host to answer an intent.
    pub submit_timeout_ms: u64,

    /// Pull interval used as a fallback to change notifications.
    pub poll_interval_ms: u64,

    /// How often a host proactively expires declaration deadlines.
    pub sweep_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            submit_timeout_ms: 5_000,
            poll_interval_ms: 2_000,
            sweep_interval_ms: 500,
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by any of the `UNO_SYNC_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as `from_env` with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(ms) = parse_millis(&lookup, ENV_SUBMIT_TIMEOUT_MS)? {
            config.submit_timeout_ms = ms;
        }
        if let Some(ms) = parse_millis(&lookup, ENV_POLL_INTERVAL_MS)? {
            config.poll_interval_ms = ms;
        }
        if let Some(ms) = parse_millis(&lookup, ENV_SWEEP_INTERVAL_MS)? {
            config.sweep_interval_ms = ms;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout_ms = period_millis(timeout);
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = period_millis(interval);
        self
    }

    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_ms = period_millis(interval);
        self
    }

    #[must_use]
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms.max(1))
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}

/// Whole milliseconds, at least one. Timer periods of zero are not allowed.
fn period_millis(period: Duration) -> u64 {
    u64::try_from(period.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn parse_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Some(ms)),
        _ => Err(ConfigError::InvalidMillis { var, value: raw }),
    }
}

/// Automated player pacing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Delay before an automated player acts on its turn.
    pub think_delay_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { think_delay_ms: 700 }
    }
}

impl DriverConfig {
    #[must_use]
    pub fn with_think_delay(mut self, delay: Duration) -> Self {
        self.think_delay_ms = delay.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }
}
