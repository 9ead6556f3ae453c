//! YAML configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.collectfast/
//!   config.yaml   (optional — defaults apply when missing)
//!   cache/        (default directory for the file-backed shared cache)
//! ```
//!
//! # API pattern
//!
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Prefix namespacing every shared cache key written by collectfast.
pub const DEFAULT_KEY_PREFIX: &str = "collectfast_asset_";

/// Which shared cache implementation backs the second lookup tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// JSON files under [`CacheConfig::dir`]; survives across runs.
    #[default]
    File,
    /// Process-local map; only the current run benefits.
    Memory,
    /// Shared tier disabled; every run queries the remote store.
    None,
}

/// `cache:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Overrides `~/.collectfast/cache`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    pub key_prefix: String,
    /// Eviction age for the file backend. `None` keeps entries until they
    /// are invalidated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::File,
            dir: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            ttl_secs: None,
        }
    }
}

impl CacheConfig {
    /// Configured cache directory, or `<home>/.collectfast/cache`.
    pub fn resolved_dir(&self, home: &Path) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| collectfast_root(home).join("cache"))
    }
}

/// `sync:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Prepended to every relative source path to form the bucket key.
    pub prefix: String,
}

/// Root of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub sync: SyncConfig,
}

/// `<home>/.collectfast/`
pub fn collectfast_root(home: &Path) -> PathBuf {
    home.join(".collectfast")
}

/// `<home>/.collectfast/config.yaml`
pub fn config_path_at(home: &Path) -> PathBuf {
    collectfast_root(home).join("config.yaml")
}

/// Load `<home>/.collectfast/config.yaml`.
///
/// Returns [`Config::default`] if the file does not exist and
/// [`ConfigError::Parse`] (with path + line context) if it is malformed.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

/// Resolve the user's home directory.
pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let config = load_at(tmp.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cache.key_prefix, DEFAULT_KEY_PREFIX);
        assert_eq!(config.sync.prefix, "");
    }

    #[test]
    fn resolved_dir_defaults_under_home() {
        let home = Path::new("/home/deploy");
        let cache = CacheConfig::default();
        assert_eq!(
            cache.resolved_dir(home),
            PathBuf::from("/home/deploy/.collectfast/cache")
        );
    }
}
