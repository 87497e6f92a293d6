//! Remote authentication configuration.

use std::fmt;

use serde::Deserialize;

/// Where and how to reach the RADIUS server.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct RadiusConfig {
    /// `host:port`, e.g. `10.0.0.5:1812`.
    pub server: String,
    /// Secret shared with the server.
    pub shared_secret: String,
    /// Deadline for one exchange, in seconds (default: 5).
    pub timeout_secs: u64,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:1812".into(),
            shared_secret: String::new(),
            timeout_secs: 5,
        }
    }
}

impl fmt::Debug for RadiusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadiusConfig")
            .field("server", &self.server)
            .field("shared_secret", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
