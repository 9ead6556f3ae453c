//! Skip-or-upload decisions.
//!
//! ## `should_upload` — decision protocol
//!
//! 1. Forced → Upload, without touching the cache.
//! 2. Resolve remote metadata: lookup cache, else the remote provider.
//!    A successful query (including "absent") is cached; a failed query is
//!    never cached and yields Upload.
//! 3. Fingerprint the local content as a quoted MD5 ETag.
//! 4. Equal to the remote ETag → Skip; otherwise Upload.
//!
//! After a real upload or delete the caller reports it back through
//! [`SyncDecisionEngine::record_upload`] / [`SyncDecisionEngine::record_delete`]
//! so the next run re-queries the remote store instead of trusting
//! pre-upload metadata. In dry-run mode the engine never writes to or
//! invalidates the cache.

use collectfast_core::{DestinationPath, Reason, RemoteMetadata, Verdict};

use crate::fingerprint::fingerprint;
use crate::lookup::LookupCache;
use crate::remote::RemoteMetadataProvider;
use crate::shared_cache::SharedCache;

/// Engine-wide switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Prefix for shared cache keys.
    pub key_prefix: String,
    /// Report decisions without mutating the cache.
    pub dry_run: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            key_prefix: collectfast_core::config::DEFAULT_KEY_PREFIX.to_string(),
            dry_run: false,
        }
    }
}

/// Per-run decision engine. Construct one per sync run; its in-memory lookup
/// table lives exactly as long as the engine.
pub struct SyncDecisionEngine<'a> {
    cache: LookupCache<'a>,
    provider: &'a dyn RemoteMetadataProvider,
    options: EngineOptions,
    skipped: usize,
    remote_queries: usize,
}

impl<'a> SyncDecisionEngine<'a> {
    pub fn new(
        shared: &'a dyn SharedCache,
        provider: &'a dyn RemoteMetadataProvider,
        options: EngineOptions,
    ) -> Self {
        Self {
            cache: LookupCache::new(shared, options.key_prefix.clone()),
            provider,
            options,
            skipped: 0,
            remote_queries: 0,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Decide whether `content` must be uploaded to `path`.
    ///
    /// Never fails: every lookup problem resolves to Upload.
    pub fn should_upload(
        &mut self,
        path: &DestinationPath,
        content: &[u8],
        force_upload: bool,
    ) -> Verdict {
        if force_upload {
            return Verdict::upload(Reason::Forced);
        }

        let remote = match self.resolve(path) {
            Ok(remote) => remote,
            Err(reason) => return Verdict::upload(reason),
        };

        match remote {
            RemoteMetadata::Absent => {
                tracing::debug!("remote object not found: {path}");
                Verdict::upload(Reason::RemoteAbsent)
            }
            RemoteMetadata::Present { etag } => {
                if fingerprint(content) == etag {
                    tracing::debug!("skipping '{path}' based on matching ETags");
                    self.skipped += 1;
                    Verdict::skip(Reason::ETagMatch)
                } else {
                    tracing::debug!("ETag didn't match: {path}");
                    Verdict::upload(Reason::ETagMismatch)
                }
            }
        }
    }

    /// The caller uploaded `path`; drop whatever the cache knew about it.
    pub fn record_upload(&mut self, path: &DestinationPath) {
        if self.options.dry_run {
            return;
        }
        self.cache.invalidate(path);
    }

    /// The caller deleted `path`. A cached `Present` entry would otherwise
    /// turn the next comparison for `path` into a Skip.
    pub fn record_delete(&mut self, path: &DestinationPath) {
        if self.options.dry_run {
            return;
        }
        self.cache.invalidate(path);
    }

    /// Files skipped so far in this run.
    pub fn skipped_count(&self) -> usize {
        self.skipped
    }

    /// Queries issued to the remote provider so far in this run.
    pub fn remote_query_count(&self) -> usize {
        self.remote_queries
    }

    fn resolve(&mut self, path: &DestinationPath) -> Result<RemoteMetadata, Reason> {
        if let Some(cached) = self.cache.get(path) {
            return Ok(cached);
        }

        self.remote_queries += 1;
        match self.provider.lookup(path) {
            Ok(remote) => {
                if !self.options.dry_run {
                    self.cache.populate(path, remote.clone());
                }
                Ok(remote)
            }
            Err(err) => {
                tracing::warn!("comparison unavailable for {path}, uploading: {err}");
                Err(Reason::ComparisonUnavailable(err.to_string()))
            }
        }
    }
}
