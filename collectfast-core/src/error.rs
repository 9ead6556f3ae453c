//! Error types for collectfast-core.

use std::path::PathBuf;

use thiserror::Error;

/// A destination path was rejected before reaching the decision engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("destination path is empty")]
    Empty,

    #[error("destination path '{path}' must be relative to the bucket root")]
    Absolute { path: String },

    #[error("destination path '{path}' contains a '..' segment")]
    ParentSegment { path: String },

    #[error("destination path '{path}' contains forbidden character {ch:?}")]
    ForbiddenChar { path: String, ch: char },
}

/// All errors that can arise from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}
