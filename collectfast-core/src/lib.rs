//! collectfast core library — domain types, configuration, errors.
//!
//! Public API surface:
//! - [`types`] — destination paths, entity tags, remote metadata, verdicts
//! - [`error`] — [`PathError`], [`ConfigError`]
//! - [`config`] — YAML configuration load

pub mod config;
pub mod error;
pub mod types;

pub use config::{CacheBackend, CacheConfig, Config, SyncConfig};
pub use error::{ConfigError, PathError};
pub use types::{Decision, DestinationPath, ETag, Reason, RemoteMetadata, Verdict};
