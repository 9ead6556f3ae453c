pub mod cache;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};

use collectfast_core::{config, CacheBackend, Config};
use collectfast_sync::{FileCache, MemoryCache, NullCache, SharedCache};

/// Home directory plus the config loaded from it.
pub(crate) fn load_config() -> Result<(PathBuf, Config)> {
    let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
    let config = config::load_at(&home).context("failed to load collectfast config")?;
    Ok((home, config))
}

/// The file-backed cache described by `config`, whatever backend is active.
pub(crate) fn file_cache(home: &std::path::Path, config: &Config) -> FileCache {
    let dir = config.cache.resolved_dir(home);
    match config.cache.ttl_secs {
        Some(secs) => FileCache::with_ttl(dir, std::time::Duration::from_secs(secs)),
        None => FileCache::new(dir),
    }
}

/// Build the shared cache for `backend`.
pub(crate) fn shared_cache(
    home: &std::path::Path,
    config: &Config,
    backend: CacheBackend,
) -> Box<dyn SharedCache> {
    match backend {
        CacheBackend::File => Box::new(file_cache(home, config)),
        CacheBackend::Memory => Box::new(MemoryCache::new()),
        CacheBackend::None => Box::new(NullCache),
    }
}
