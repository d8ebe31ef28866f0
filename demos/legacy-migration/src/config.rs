//! `[server]` table of `trellis.toml`, overridden by `TRELLIS_ADDR`.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const ENV_ADDR: &str = "TRELLIS_ADDR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
}

impl ServerConfig {
    pub fn load(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = base.as_ref().join("trellis.toml");
        let mut config = if path.exists() {
            Self::from_toml(&fs::read_to_string(&path)?)?
        } else {
            Self::default()
        };
        if let Ok(addr) = std::env::var(ENV_ADDR) {
            config.addr = addr;
        }
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str::<ConfigFile>(content)?.server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_table() {
        let config = ServerConfig::from_toml("[server]\naddr = \"0.0.0.0:8080\"\n").unwrap();
        assert_eq!(config.addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_table_uses_default() {
        let config = ServerConfig::from_toml("[harness]\nupdate = \"no\"\n").unwrap();
        assert_eq!(config, ServerConfig::default());
    }
}
