//! Daemon configuration loaded from TOML.

use std::path::{Path, PathBuf};

use gatehouse_auth::SessionConfig;
use gatehouse_db::DbConfig;
use serde::Deserialize;

/// Environment variable naming the config file when no CLI argument is
/// given.
pub const CONFIG_ENV: &str = "GATEHOUSE_CONFIG";

/// Top-level daemon configuration. Every section falls back to its
/// defaults when omitted; unknown sections are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub database: DbConfig,
    pub session: SessionConfig,
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config path from the first CLI argument, then
    /// `GATEHOUSE_CONFIG`. Defaults apply when neither is set.
    pub fn load(arg: Option<String>) -> Result<Self, ConfigError> {
        match arg.or_else(|| std::env::var(CONFIG_ENV).ok()) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.prune_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "session.prune_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}
