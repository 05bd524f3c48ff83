//! Settings loaded from a TOML file
//!
//! Every section is optional. Environment variables override whatever the
//! file sets (see [`super::Config::from_env`]).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::{SessionExpiry, TypingPacing};

/// Root file configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub storage: StorageSection,

    /// Typing simulation for conversation sessions
    #[serde(default)]
    pub chat: TypingPacing,

    /// Idle expiry for conversation sessions
    #[serde(default)]
    pub sessions: SessionExpiry,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == Some(0) {
            return Err(ConfigError::Validation("server.port must not be 0".into()));
        }
        if self.sessions.idle_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "sessions.idle_timeout_secs must not be 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSection {
    /// Directory holding the SQLite database
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Keep everything in memory; nothing survives a restart
    #[serde(default)]
    pub ephemeral: bool,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
