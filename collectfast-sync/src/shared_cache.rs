//! Shared cache backends — the second lookup tier.
//!
//! A shared cache outlives a single run and may be used by several
//! deployments at once, so every backend is `Send + Sync` and treats
//! last-write-wins as acceptable. Values are opaque strings; the lookup layer
//! owns their encoding.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{cache_io_err, CacheError};

/// Key/value store shared across runs.
///
/// Deleting a missing key must succeed.
pub trait SharedCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

// ---------------------------------------------------------------------------
// MemoryCache
// ---------------------------------------------------------------------------

/// Process-local shared cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".to_string()))
    }
}

impl SharedCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NullCache
// ---------------------------------------------------------------------------

/// Always misses; writes are discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl SharedCache for NullCache {
    fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), CacheError> {
        Ok(())
    }

    fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileCache
// ---------------------------------------------------------------------------

/// On-disk envelope for one cached value.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileCacheEntry {
    stored_at: DateTime<Utc>,
    value: String,
}

/// Directory-backed shared cache: one `<key>.json` file per entry.
///
/// Writes go to a per-process `.tmp` file and are renamed into place, so
/// concurrent writers never expose a half-written entry. With a TTL set,
/// entries older than the TTL read as misses and are removed.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    ttl: Option<Duration>,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: None,
        }
    }

    pub fn with_ttl(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl: Some(ttl),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<key>.json`. Bytes outside `[A-Za-z0-9._-]` are written as
    /// `%XX`, so distinct keys always map to distinct files.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("%{byte:02X}"));
            }
        }
        self.dir.join(format!("{name}.json"))
    }

    /// Remove every entry. A missing directory is not an error.
    pub fn clear(&self) -> Result<(), CacheError> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(cache_io_err(&self.dir, e)),
        }
    }

    fn is_expired(&self, entry: &FileCacheEntry) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => Utc::now().signed_duration_since(entry.stored_at) > ttl,
            Err(_) => false,
        }
    }
}

impl SharedCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.entry_path(key);
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(cache_io_err(&path, e)),
        };
        let entry: FileCacheEntry = serde_json::from_str(&contents)?;
        if self.is_expired(&entry) {
            tracing::debug!("cache entry expired: {}", path.display());
            self.delete(key)?;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| cache_io_err(&self.dir, e))?;

        let path = self.entry_path(key);
        let json = serde_json::to_string(&FileCacheEntry {
            stored_at: Utc::now(),
            value: value.to_string(),
        })?;
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
        std::fs::write(&tmp, json).map_err(|e| cache_io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(cache_io_err(&path, e));
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(cache_io_err(&path, e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    #[test]
    fn memory_cache_set_get_delete() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("k").unwrap(), None);
        cache.set("k", "v").unwrap();
        assert_eq!(cache.get("k").unwrap(), Some("v".to_string()));
        assert_eq!(cache.len(), 1);
        cache.delete("k").unwrap();
        cache.delete("k").unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn null_cache_never_hits() {
        let cache = NullCache;
        cache.set("k", "v").unwrap();
        assert_eq!(cache.get("k").unwrap(), None);
        cache.delete("k").unwrap();
    }

    #[test]
    fn file_cache_roundtrip_across_instances() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("cache");
        FileCache::new(&dir).set("collectfast_asset_ab", "payload").unwrap();

        let reopened = FileCache::new(&dir);
        assert_eq!(
            reopened.get("collectfast_asset_ab").unwrap(),
            Some("payload".to_string())
        );
    }

    #[test]
    fn file_cache_missing_dir_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path().join("never-created"));
        assert_eq!(cache.get("k").unwrap(), None);
        cache.delete("k").unwrap();
    }

    #[test]
    fn file_cache_leaves_no_tmp_files() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        cache.set("k", "v1").unwrap();
        cache.set("k", "v2").unwrap();
        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["k.json".to_string()]);
        assert_eq!(cache.get("k").unwrap(), Some("v2".to_string()));
    }

    #[test]
    fn file_cache_escapes_key_into_file_name() {
        let cache = FileCache::new("/cache");
        assert_eq!(
            cache.entry_path("site/a:b"),
            PathBuf::from("/cache/site%2Fa%3Ab.json")
        );
        assert_eq!(
            cache.entry_path("collectfast_asset_ab"),
            PathBuf::from("/cache/collectfast_asset_ab.json")
        );
    }

    #[test]
    fn file_cache_keeps_lookalike_prefixes_apart() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        cache.set("site:ab", "colon").unwrap();
        cache.set("site_ab", "underscore").unwrap();
        cache.set("site%3Aab", "literal").unwrap();

        assert_eq!(cache.get("site:ab").unwrap(), Some("colon".to_string()));
        assert_eq!(cache.get("site_ab").unwrap(), Some("underscore".to_string()));
        assert_eq!(cache.get("site%3Aab").unwrap(), Some("literal".to_string()));
    }

    #[test]
    fn file_cache_expired_entry_reads_as_miss_and_is_removed() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::with_ttl(tmp.path(), Duration::from_secs(60));
        let stale = FileCacheEntry {
            stored_at: Utc::now() - ChronoDuration::hours(1),
            value: "old".to_string(),
        };
        std::fs::write(
            cache.entry_path("k"),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();

        assert_eq!(cache.get("k").unwrap(), None);
        assert!(!cache.entry_path("k").exists());
    }

    #[test]
    fn file_cache_fresh_entry_survives_ttl() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::with_ttl(tmp.path(), Duration::from_secs(3600));
        cache.set("k", "fresh").unwrap();
        assert_eq!(cache.get("k").unwrap(), Some("fresh".to_string()));
    }

    #[test]
    fn file_cache_corrupt_entry_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        std::fs::write(cache.entry_path("k"), "{not json").unwrap();
        assert!(matches!(cache.get("k"), Err(CacheError::Json(_))));
    }

    #[test]
    fn file_cache_clear_removes_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("cache");
        let cache = FileCache::new(&dir);
        cache.set("k", "v").unwrap();
        cache.clear().unwrap();
        assert!(!dir.exists());
        cache.clear().unwrap();
    }
}
