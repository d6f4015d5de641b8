use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const LOCK_TIMEOUT_ENV: &str = "STOCKBOOK_LOCK_TIMEOUT_MS";
pub const MAX_RETRIES_ENV: &str = "STOCKBOOK_MAX_RETRIES";
pub const RETRY_BACKOFF_ENV: &str = "STOCKBOOK_RETRY_BACKOFF_MS";

/// Engine and store tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// How long a commit waits for an item's lock before giving up.
    pub lock_timeout_ms: u64,
    /// Retries after the first attempt before `ConcurrentModification`.
    pub max_retries: u32,
    /// Base backoff between retries; attempt `n` sleeps `n × backoff`.
    pub retry_backoff_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 250,
            max_retries: 5,
            retry_backoff_ms: 2,
        }
    }
}

impl LedgerConfig {
    /// Read overrides from the environment. Unset variables keep the default;
    /// unparsable ones keep it too, with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lock_timeout_ms: env_or(LOCK_TIMEOUT_ENV, defaults.lock_timeout_ms),
            max_retries: env_or(MAX_RETRIES_ENV, defaults.max_retries),
            retry_backoff_ms: env_or(RETRY_BACKOFF_ENV, defaults.retry_backoff_ms),
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// First attempt plus retries.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: core::str::FromStr + core::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_or(name, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(name: &str, raw: &str, default: T) -> T
where
    T: core::str::FromStr + core::fmt::Display,
{
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(variable = name, value = raw, fallback = %default, "ignoring unparsable setting");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_short_and_bounded() {
        let cfg = LedgerConfig::default();
        assert_eq!(cfg.lock_timeout(), Duration::from_millis(250));
        assert_eq!(cfg.max_attempts(), 6);
        assert_eq!(cfg.retry_backoff(), Duration::from_millis(2));
    }

    #[test]
    fn unparsable_values_fall_back() {
        assert_eq!(parse_or(MAX_RETRIES_ENV, "lots", 5u32), 5);
        assert_eq!(parse_or(MAX_RETRIES_ENV, " 9 ", 5u32), 9);
        assert_eq!(parse_or(LOCK_TIMEOUT_ENV, "-1", 250u64), 250);
    }

    #[test]
    fn deserializes_partial_config() {
        let cfg: LedgerConfig = serde_json::from_str(r#"{ "max_retries": 1 }"#).unwrap();
        assert_eq!(cfg.max_retries, 1);
        assert_eq!(cfg.lock_timeout_ms, 250);
    }
}
