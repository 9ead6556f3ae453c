//! Shared fakes for collectfast-sync integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};

use collectfast_core::{DestinationPath, RemoteMetadata};
use collectfast_sync::{
    CacheError, MemoryCache, RemoteError, RemoteMetadataProvider, SharedCache, Storage,
    StorageError,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn dest(p: &str) -> DestinationPath {
    DestinationPath::new(p).expect("valid destination")
}

/// Wraps a provider and counts lookups; can be switched into failure mode.
pub struct CountingRemote<'a, P: RemoteMetadataProvider> {
    pub inner: &'a P,
    pub queries: Cell<usize>,
    pub fail: Cell<bool>,
}

impl<'a, P: RemoteMetadataProvider> CountingRemote<'a, P> {
    pub fn new(inner: &'a P) -> Self {
        Self {
            inner,
            queries: Cell::new(0),
            fail: Cell::new(false),
        }
    }

    pub fn take_queries(&self) -> usize {
        self.queries.replace(0)
    }
}

impl<P: RemoteMetadataProvider> RemoteMetadataProvider for CountingRemote<'_, P> {
    fn lookup(&self, path: &DestinationPath) -> Result<RemoteMetadata, RemoteError> {
        self.queries.set(self.queries.get() + 1);
        if self.fail.get() {
            return Err(RemoteError::Transport("503 Slow Down".into()));
        }
        self.inner.lookup(path)
    }
}

/// Memory-backed shared cache that counts every call and can be taken down.
#[derive(Default)]
pub struct SpyCache {
    pub inner: MemoryCache,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    pub deletes: AtomicUsize,
    pub down: std::sync::atomic::AtomicBool,
}

impl SpyCache {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        self.writes.load(Ordering::SeqCst) + self.deletes.load(Ordering::SeqCst)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

impl SharedCache for SpyCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.delete(key)
    }
}

/// Storage wrapper that counts mutations and can reject uploads.
pub struct SpyStorage<'a, S: Storage> {
    pub inner: &'a S,
    pub uploads: Cell<usize>,
    pub deletes: Cell<usize>,
    pub reject_uploads: Cell<bool>,
}

impl<'a, S: Storage> SpyStorage<'a, S> {
    pub fn new(inner: &'a S) -> Self {
        Self {
            inner,
            uploads: Cell::new(0),
            deletes: Cell::new(0),
            reject_uploads: Cell::new(false),
        }
    }
}

impl<S: Storage> Storage for SpyStorage<'_, S> {
    fn upload(&self, path: &DestinationPath, content: &[u8]) -> Result<(), StorageError> {
        self.uploads.set(self.uploads.get() + 1);
        if self.reject_uploads.get() {
            return Err(StorageError::Backend("403 AccessDenied".into()));
        }
        self.inner.upload(path, content)
    }

    fn delete(&self, path: &DestinationPath) -> Result<(), StorageError> {
        self.deletes.set(self.deletes.get() + 1);
        self.inner.delete(path)
    }

    fn list(&self) -> Result<Vec<DestinationPath>, StorageError> {
        self.inner.list()
    }
}
