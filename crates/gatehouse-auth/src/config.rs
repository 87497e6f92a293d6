//! Session engine configuration.

use serde::Deserialize;

/// Configuration for the session service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session lifetime used when a caller does not pass one
    /// (default: 86_400 = 24 hours).
    pub session_ttl_secs: i64,
    /// Interval between background expiry sweeps
    /// (default: 300 = 5 minutes).
    pub prune_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 86_400,
            prune_interval_secs: 300,
        }
    }
}
