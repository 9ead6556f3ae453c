//! # collectfast-sync
//!
//! Change detection for syncing static assets to an object store.
//!
//! Build a [`SyncDecisionEngine`] over a [`SharedCache`] and a
//! [`RemoteMetadataProvider`], then hand it to a [`SyncRunner`] together with
//! a [`Storage`] to process a run. The engine alone can be driven file by
//! file by callers with their own upload pipeline.

pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod lookup;
pub mod remote;
pub mod runner;
pub mod shared_cache;

pub use engine::{EngineOptions, SyncDecisionEngine};
pub use error::{CacheError, RemoteError, StorageError, SyncError};
pub use fingerprint::{cache_key, fingerprint, fingerprint_text};
pub use lookup::LookupCache;
pub use remote::{DirectoryBucket, RemoteMetadataProvider, Storage};
pub use runner::{collect_dir, AssetPair, FileOutcome, RunOptions, SyncReport, SyncRunner};
pub use shared_cache::{FileCache, MemoryCache, NullCache, SharedCache};
