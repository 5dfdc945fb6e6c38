//! Configuration consumed by the Leader (§6, expanded per §10.3).
//!
//! `message_timeout` mirrors `HEARTBEAT_TIMEOUT` from the original
//! consensus module (150ms); the heartbeat driver runs at
//! `message_timeout / 6`, reproducing the same "about six heartbeats per
//! election timeout" cadence described in §4.2.

use std::time::Duration;

use serde_derive::{Deserialize, Serialize};

/// Matches `HEARTBEAT_TIMEOUT` in the original consensus module.
pub const DEFAULT_MESSAGE_TIMEOUT_MILLIS: u64 = 150;
pub const DEFAULT_MAX_ENTRIES_PER_REQUEST: u32 = 64;

/// The heartbeat period is `message_timeout / HEARTBEAT_DIVISOR` (§4.2).
const HEARTBEAT_DIVISOR: u32 = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub message_timeout_millis: u64,
    pub max_entries_per_request: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            message_timeout_millis: DEFAULT_MESSAGE_TIMEOUT_MILLIS,
            max_entries_per_request: DEFAULT_MAX_ENTRIES_PER_REQUEST,
        }
    }
}

impl Config {
    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.message_timeout_millis)
    }

    pub fn heartbeat_period(&self) -> Duration {
        self.message_timeout() / HEARTBEAT_DIVISOR
    }

    /// Loads a `Config` from a TOML document. Embedding the Leader as a
    /// library does not require this; constructing `Config` directly (or
    /// using `Default`) is the expected path in that case.
    pub fn from_toml_str(s: &str) -> crate::error::Result<Config> {
        toml::from_str(s).map_err(|e| crate::error::ErrorKind::Config(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_heartbeat_period_divides_message_timeout_by_six() {
        let config = Config::default();
        assert_eq!(config.message_timeout(), Duration::from_millis(150));
        assert_eq!(config.heartbeat_period(), Duration::from_millis(25));
    }

    #[test]
    fn parses_from_toml() {
        let config = Config::from_toml_str("message_timeout_millis = 300\nmax_entries_per_request = 10\n").unwrap();
        assert_eq!(config.message_timeout_millis, 300);
        assert_eq!(config.max_entries_per_request, 10);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(Config::from_toml_str("not valid toml = = =").is_err());
    }
}
