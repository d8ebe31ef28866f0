//! Harness configuration.
//!
//! Read from the `[harness]` table of an optional `trellis.toml`, then
//! overridden by environment variables:
//!
//! - `TRELLIS_SNAPSHOT_DIR` - where baselines live
//! - `TRELLIS_UPDATE_SNAPSHOTS` - `new` (default), `always`, or `no`
//!
//! Relative paths are resolved against the directory holding the config
//! (normally the crate's `CARGO_MANIFEST_DIR`).

use crate::snapshot::{SnapshotStore, SnapshotUpdate};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "trellis.toml";
pub const ENV_SNAPSHOT_DIR: &str = "TRELLIS_SNAPSHOT_DIR";
pub const ENV_UPDATE_SNAPSHOTS: &str = "TRELLIS_UPDATE_SNAPSHOTS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value `{value}` for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub snapshot_dir: PathBuf,
    pub update: SnapshotUpdate,
    /// Legacy artifacts to fingerprint.
    pub sources: Vec<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("tests/snapshots"),
            update: SnapshotUpdate::New,
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    harness: HarnessConfig,
}

impl HarnessConfig {
    /// Load `<base>/trellis.toml` (if present) and apply env overrides.
    pub fn load(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref();
        let mut config = Self::from_file(&base.join(CONFIG_FILE))?;
        config.apply_env(|var| std::env::var(var).ok())?;
        config.resolve(base);
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No harness config file; using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        Ok(toml::from_str::<ConfigFile>(content)?.harness)
    }

    /// Apply overrides from `lookup` (the process environment in `load`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_SNAPSHOT_DIR) {
            self.snapshot_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_UPDATE_SNAPSHOTS) {
            self.update = SnapshotUpdate::parse(&raw).ok_or(ConfigError::InvalidEnv {
                var: ENV_UPDATE_SNAPSHOTS,
                value: raw,
            })?;
        }
        Ok(())
    }

    fn resolve(&mut self, base: &Path) {
        if self.snapshot_dir.is_relative() {
            self.snapshot_dir = base.join(&self.snapshot_dir);
        }
        for source in &mut self.sources {
            if source.is_relative() {
                *source = base.join(&*source);
            }
        }
    }

    pub fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.snapshot_dir).with_update(self.update)
    }
}
