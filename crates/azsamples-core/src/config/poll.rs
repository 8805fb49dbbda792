//! Poll settings for long-running operations as stored in profiles

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::progress::{DEFAULT_POLL_INTERVAL, PollPolicy};

/// Profile-level poll configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between status checks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Give up waiting after this many seconds (unbounded when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: None,
        }
    }
}

impl From<&PollConfig> for PollPolicy {
    fn from(config: &PollConfig) -> Self {
        let policy = PollPolicy::new(Duration::from_secs(config.interval_secs));
        match config.timeout_secs {
            Some(secs) => policy.with_timeout(Duration::from_secs(secs)),
            None => policy,
        }
    }
}

fn default_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}
