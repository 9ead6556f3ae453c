//! Two-tier read path in front of the remote metadata store.
//!
//! ```text
//! get(path)
//!   1. per-run table   → hit: return (including `Absent`)
//!   2. shared cache    → hit: copy into the table, return
//!   3. miss            → None; the engine queries the remote store
//! ```
//!
//! The shared tier is advisory. Any failure talking to it (unreachable
//! backend, undecodable value) degrades to a miss on read and is logged and
//! ignored on write, so a broken cache only costs extra remote queries.

use std::collections::HashMap;

use collectfast_core::{DestinationPath, RemoteMetadata};

use crate::fingerprint::cache_key;
use crate::shared_cache::SharedCache;

/// Per-run lookup cache backed by an injected [`SharedCache`].
///
/// The per-run table starts empty and is dropped with the run; it is never
/// persisted.
pub struct LookupCache<'c> {
    shared: &'c dyn SharedCache,
    key_prefix: String,
    table: HashMap<DestinationPath, RemoteMetadata>,
}

impl<'c> LookupCache<'c> {
    pub fn new(shared: &'c dyn SharedCache, key_prefix: impl Into<String>) -> Self {
        Self {
            shared,
            key_prefix: key_prefix.into(),
            table: HashMap::new(),
        }
    }

    /// Shared cache key for `path` under this cache's prefix.
    pub fn key_for(&self, path: &DestinationPath) -> String {
        cache_key(&self.key_prefix, path)
    }

    /// Resolve `path` from memory, then the shared cache. `None` means
    /// unknown, not absent.
    pub fn get(&mut self, path: &DestinationPath) -> Option<RemoteMetadata> {
        if let Some(entry) = self.table.get(path) {
            return Some(entry.clone());
        }

        let key = self.key_for(path);
        let raw = match self.shared.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("shared cache read failed for {path}: {err}");
                return None;
            }
        };

        match serde_json::from_str::<RemoteMetadata>(&raw) {
            Ok(entry) => {
                self.table.insert(path.clone(), entry.clone());
                Some(entry)
            }
            Err(err) => {
                tracing::warn!("ignoring undecodable cache entry for {path}: {err}");
                None
            }
        }
    }

    /// Record a fresh remote lookup in both tiers. No expiry is set; the
    /// shared backend's own eviction applies.
    pub fn populate(&mut self, path: &DestinationPath, entry: RemoteMetadata) {
        let key = self.key_for(path);
        match serde_json::to_string(&entry) {
            Ok(raw) => {
                if let Err(err) = self.shared.set(&key, &raw) {
                    tracing::warn!("shared cache write failed for {path}: {err}");
                }
            }
            Err(err) => tracing::warn!("could not encode cache entry for {path}: {err}"),
        }
        self.table.insert(path.clone(), entry);
    }

    /// Forget `path` in both tiers. The shared delete is issued even when the
    /// per-run table had no entry.
    pub fn invalidate(&mut self, path: &DestinationPath) {
        self.table.remove(path);
        let key = self.key_for(path);
        if let Err(err) = self.shared.delete(&key) {
            tracing::warn!("shared cache delete failed for {path}: {err}");
        }
    }
}
