use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MirrorError, Result};

/// Prefix shared by every recognized environment override.
pub const ENV_PREFIX: &str = "MIRROR_";

/// Where a configuration value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in default value
    Default,
    /// From a TOML configuration file
    File(PathBuf),
    /// From environment variable
    Environment(String),
}

impl ConfigSource {
    pub fn as_str(&self) -> &str {
        match self {
            ConfigSource::Default => "default",
            ConfigSource::File(_) => "file",
            ConfigSource::Environment(var) => var,
        }
    }
}

/// Loads configuration from files and `MIRROR_*` environment variables
#[derive(Debug)]
pub struct ConfigLoader {
    use_environment: bool,
}

impl ConfigLoader {
    pub fn new(use_environment: bool) -> Self {
        Self { use_environment }
    }

    /// Read a TOML file, returning `None` when it does not exist
    pub fn read_file(&self, path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(path)
            .map(Some)
            .map_err(|e| MirrorError::Config(format!("Failed to read {}: {}", path.display(), e)))
    }

    /// Get a `MIRROR_*` environment variable. Empty values count as unset.
    pub fn get_env(&self, key: &str) -> Option<String> {
        if !self.use_environment {
            return None;
        }

        env::var(format!("{}{}", ENV_PREFIX, key))
            .ok()
            .filter(|s| !s.is_empty())
    }

    pub fn get_env_path(&self, key: &str) -> Option<PathBuf> {
        self.get_env(key).map(PathBuf::from)
    }

    pub fn get_env_u64(&self, key: &str) -> Option<u64> {
        self.parse_env(key)
    }

    pub fn get_env_i64(&self, key: &str) -> Option<i64> {
        self.parse_env(key)
    }

    pub fn get_env_u32(&self, key: &str) -> Option<u32> {
        self.parse_env(key)
    }

    pub fn get_env_usize(&self, key: &str) -> Option<usize> {
        self.parse_env(key)
    }

    fn parse_env<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.get_env(key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring {}{}: not a valid number ({})", ENV_PREFIX, key, raw);
                None
            }
        }
    }
}
