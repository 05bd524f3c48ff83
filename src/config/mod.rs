//! Application configuration

pub mod file;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::{SessionExpiry, TypingPacing};

pub use file::{ConfigError, FileConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Keep profiles and accounts in memory only
    pub ephemeral: bool,
    pub pacing: TypingPacing,
    pub expiry: SessionExpiry,
    /// Fixed seed for reply selection, for reproducible runs
    pub seed: Option<u64>,
}

impl Config {
    /// Build from the optional TOML file named by `AEGIS_CONFIG`, then apply
    /// environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = match env::var("AEGIS_CONFIG") {
            Ok(path) => FileConfig::from_file(&PathBuf::from(path))?,
            Err(_) => FileConfig::default(),
        };

        Ok(Self::resolve(file, |key| env::var(key).ok()))
    }

    fn resolve(file: FileConfig, var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: var("HOST")
                .or(file.server.host)
                .unwrap_or_else(|| "127.0.0.1".into()),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .or(file.server.port)
                .unwrap_or(3000),
            data_dir: var("AEGIS_DATA_DIR")
                .map(PathBuf::from)
                .or(file.storage.data_dir)
                .unwrap_or_else(|| PathBuf::from("./data")),
            ephemeral: var("AEGIS_EPHEMERAL")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(file.storage.ephemeral),
            pacing: file.chat,
            expiry: file.sessions,
            seed: var("AEGIS_SEED").and_then(|s| s.parse().ok()),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("aegis.db")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(FileConfig::default(), |_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_path(), PathBuf::from("./data/aegis.db"));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig::from_str("[server]\nhost = \"0.0.0.0\"\nport = 8080\n").unwrap();
        let vars: HashMap<&str, &str> = [("PORT", "9000")].into_iter().collect();

        let config = Config::resolve(file, |key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_unparseable_port_falls_back() {
        let vars: HashMap<&str, &str> = [("PORT", "not-a-port")].into_iter().collect();
        let config = Config::resolve(FileConfig::default(), |key| {
            vars.get(key).map(|v| v.to_string())
        });
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_ephemeral_storage_flag() {
        let file = FileConfig::from_str("[storage]\nephemeral = true\n").unwrap();
        assert!(Config::resolve(file.clone(), |_| None).ephemeral);

        let config = Config::resolve(file, |key| {
            (key == "AEGIS_EPHEMERAL").then(|| "false".to_string())
        });
        assert!(!config.ephemeral);
        assert!(!Config::default().ephemeral);
    }
}
