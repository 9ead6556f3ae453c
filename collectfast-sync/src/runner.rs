//! Sync run orchestration.
//!
//! A run walks the asset pairs once, in order, asking the decision engine
//! about each file and performing the upload when told to. With `clear`
//! set, every object already in the bucket is deleted first.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use collectfast_core::{Decision, DestinationPath, Reason, Verdict};

use crate::engine::SyncDecisionEngine;
use crate::error::{io_err, SyncError};
use crate::remote::Storage;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One local file and the bucket key it syncs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPair {
    pub source: PathBuf,
    pub destination: DestinationPath,
}

/// Caller-facing switches for a run. Dry-run lives on the engine options so
/// the engine and runner can never disagree about it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Upload every file, ignoring cached and remote metadata.
    pub force_upload: bool,
    /// Delete every object in the bucket before syncing.
    pub clear: bool,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// What happened to a single bucket key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FileOutcome {
    Uploaded { path: DestinationPath, reason: Reason },
    /// Dry-run: the file would have been uploaded.
    WouldUpload { path: DestinationPath, reason: Reason },
    Skipped { path: DestinationPath, reason: Reason },
    Deleted { path: DestinationPath },
    /// Dry-run: the object would have been deleted.
    WouldDelete { path: DestinationPath },
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    /// Uploads performed (or, in dry-run, that would have been).
    pub uploaded: usize,
    pub skipped: usize,
    /// Deletes performed (or, in dry-run, that would have been).
    pub deleted: usize,
    pub remote_queries: usize,
    pub elapsed_ms: u64,
    #[serde(skip)]
    pub elapsed: Duration,
    pub outcomes: Vec<FileOutcome>,
}

// ---------------------------------------------------------------------------
// SyncRunner
// ---------------------------------------------------------------------------

/// Drives one sync run against a [`Storage`].
pub struct SyncRunner<'a> {
    engine: SyncDecisionEngine<'a>,
    storage: &'a dyn Storage,
    options: RunOptions,
}

impl<'a> SyncRunner<'a> {
    pub fn new(
        engine: SyncDecisionEngine<'a>,
        storage: &'a dyn Storage,
        options: RunOptions,
    ) -> Self {
        Self {
            engine,
            storage,
            options,
        }
    }

    /// Process every asset pair and return the run summary.
    ///
    /// Aborts on the first local read failure or storage failure. Remote
    /// metadata and shared cache failures never abort; they turn into
    /// uploads.
    pub fn run<I>(mut self, assets: I) -> Result<SyncReport, SyncError>
    where
        I: IntoIterator<Item = AssetPair>,
    {
        let started = Instant::now();
        let dry_run = self.engine.options().dry_run;
        let mut outcomes = Vec::new();

        // Dry-run deletes nothing, so the remote still holds these objects.
        let mut would_delete = HashSet::new();
        if self.options.clear {
            for path in self.storage.list()? {
                if dry_run {
                    would_delete.insert(path.clone());
                }
                outcomes.push(self.delete(path, dry_run)?);
            }
        }

        let mut seen = HashSet::new();
        for asset in assets {
            if !seen.insert(asset.destination.clone()) {
                tracing::warn!(
                    "found another file with the destination path '{}'; ignoring {}",
                    asset.destination,
                    asset.source.display()
                );
                continue;
            }

            let content = std::fs::read(&asset.source).map_err(|e| io_err(&asset.source, e))?;
            let verdict = if !self.options.force_upload && would_delete.contains(&asset.destination) {
                Verdict::upload(Reason::RemoteAbsent)
            } else {
                self.engine
                    .should_upload(&asset.destination, &content, self.options.force_upload)
            };
            let path = asset.destination;

            let outcome = match verdict.decision {
                Decision::Skip => FileOutcome::Skipped {
                    path,
                    reason: verdict.reason,
                },
                Decision::Upload if dry_run => {
                    tracing::info!("[dry-run] would upload '{path}' ({})", verdict.reason);
                    FileOutcome::WouldUpload {
                        path,
                        reason: verdict.reason,
                    }
                }
                Decision::Upload => {
                    let uploaded = self.storage.upload(&path, &content);
                    // Invalidate even when the upload failed part-way.
                    self.engine.record_upload(&path);
                    uploaded?;
                    tracing::info!("uploaded '{path}' ({})", verdict.reason);
                    FileOutcome::Uploaded {
                        path,
                        reason: verdict.reason,
                    }
                }
            };
            outcomes.push(outcome);
        }

        let elapsed = started.elapsed();
        let uploaded = outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Uploaded { .. } | FileOutcome::WouldUpload { .. }))
            .count();
        let deleted = outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Deleted { .. } | FileOutcome::WouldDelete { .. }))
            .count();

        Ok(SyncReport {
            dry_run,
            uploaded,
            skipped: self.engine.skipped_count(),
            deleted,
            remote_queries: self.engine.remote_query_count(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            elapsed,
            outcomes,
        })
    }

    fn delete(&mut self, path: DestinationPath, dry_run: bool) -> Result<FileOutcome, SyncError> {
        if dry_run {
            tracing::info!("pretending to delete '{path}'");
            return Ok(FileOutcome::WouldDelete { path });
        }
        tracing::info!("deleting '{path}'");
        self.storage.delete(&path)?;
        self.engine.record_delete(&path);
        Ok(FileOutcome::Deleted { path })
    }
}

// ---------------------------------------------------------------------------
// collect_dir
// ---------------------------------------------------------------------------

/// Walk `root` into asset pairs keyed `<prefix><relative/path>`, sorted by
/// destination.
///
/// Symlinks are followed. Hidden entries (`.*`) and editor backups (`*~`)
/// are ignored. A non-empty prefix without a trailing `/` gets one.
pub fn collect_dir(root: &Path, prefix: &str) -> Result<Vec<AssetPair>, SyncError> {
    let mut prefix = prefix.trim_start_matches('/').to_string();
    if !prefix.is_empty() && !prefix.ends_with('/') {
        prefix.push('/');
    }

    let mut pairs = Vec::new();
    walk(root, &prefix, &mut pairs)?;
    pairs.sort_by(|a, b| a.destination.cmp(&b.destination));
    Ok(pairs)
}

fn walk(dir: &Path, key_prefix: &str, out: &mut Vec<AssetPair>) -> Result<(), SyncError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_ignored(&name) {
            continue;
        }
        let path = entry.path();
        let metadata = std::fs::metadata(&path).map_err(|e| io_err(&path, e))?;
        if metadata.is_dir() {
            walk(&path, &format!("{key_prefix}{name}/"), out)?;
        } else {
            out.push(AssetPair {
                destination: DestinationPath::new(format!("{key_prefix}{name}"))?,
                source: path,
            });
        }
    }
    Ok(())
}

fn is_ignored(name: &str) -> bool {
    name.starts_with('.') || name.ends_with('~')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn collect_dir_prefixes_and_sorts() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("css")).unwrap();
        fs::write(tmp.path().join("css").join("b.css"), "b").unwrap();
        fs::write(tmp.path().join("a.js"), "a").unwrap();

        let pairs = collect_dir(tmp.path(), "static").unwrap();
        let keys: Vec<_> = pairs.iter().map(|p| p.destination.as_str()).collect();
        assert_eq!(keys, vec!["static/a.js", "static/css/b.css"]);
        assert_eq!(pairs[0].source, tmp.path().join("a.js"));
    }

    #[test]
    fn collect_dir_skips_hidden_and_backup_files() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join(".git").join("HEAD"), "ref").unwrap();
        fs::write(tmp.path().join(".DS_Store"), "x").unwrap();
        fs::write(tmp.path().join("app.css~"), "x").unwrap();
        fs::write(tmp.path().join("app.css"), "x").unwrap();

        let pairs = collect_dir(tmp.path(), "").unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].destination.as_str(), "app.css");
    }

    #[cfg(unix)]
    #[test]
    fn collect_dir_follows_symlinked_directories() {
        let tmp = TempDir::new().unwrap();
        let vendor = tmp.path().join("vendor");
        fs::create_dir_all(&vendor).unwrap();
        fs::write(vendor.join("lib.js"), "lib").unwrap();
        let root = tmp.path().join("static");
        fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(&vendor, root.join("vendor")).unwrap();

        let pairs = collect_dir(&root, "").unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].destination.as_str(), "vendor/lib.js");
        assert_eq!(pairs[0].source, root.join("vendor").join("lib.js"));
    }

    #[test]
    fn collect_dir_missing_root_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = collect_dir(&tmp.path().join("missing"), "").unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }

    #[test]
    fn outcome_serializes_with_action_tag() {
        let outcome = FileOutcome::Skipped {
            path: DestinationPath::new("static/a.css").unwrap(),
            reason: Reason::ETagMatch,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["action"], "skipped");
        assert_eq!(json["path"], "static/a.css");
        assert_eq!(json["reason"]["kind"], "etag_match");
    }
}
