//! `collectfast sync` — upload changed assets from a collected static tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use collectfast_core::CacheBackend;
use collectfast_sync::{
    collect_dir, DirectoryBucket, EngineOptions, FileOutcome, RunOptions, SyncDecisionEngine,
    SyncReport, SyncRunner,
};

use crate::CacheBackendArg;

/// Arguments for `collectfast sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Directory holding the collected static files.
    pub source: PathBuf,

    /// Bucket root directory to sync into.
    #[arg(long)]
    pub bucket: PathBuf,

    /// Key prefix inside the bucket (defaults to `sync.prefix` from config).
    #[arg(long)]
    pub prefix: Option<String>,

    /// Upload every file regardless of cached or remote ETags.
    #[arg(long)]
    pub ignore_etag: bool,

    /// Show what would be uploaded or deleted without changing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Delete every object in the bucket before syncing.
    #[arg(long)]
    pub clear: bool,

    /// Shared cache backend: file, memory or none (overrides config).
    #[arg(long, value_name = "BACKEND")]
    pub cache: Option<CacheBackendArg>,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let (home, config) = super::load_config()?;

        let backend: CacheBackend = self.cache.map(Into::into).unwrap_or(config.cache.backend);
        let shared = super::shared_cache(&home, &config, backend);
        let bucket = DirectoryBucket::new(&self.bucket);

        let prefix = self.prefix.as_deref().unwrap_or(&config.sync.prefix);
        let assets = collect_dir(&self.source, prefix)
            .with_context(|| format!("failed to collect files from {}", self.source.display()))?;

        let engine = SyncDecisionEngine::new(
            shared.as_ref(),
            &bucket,
            EngineOptions {
                key_prefix: config.cache.key_prefix.clone(),
                dry_run: self.dry_run,
            },
        );
        let options = RunOptions {
            force_upload: self.ignore_etag,
            clear: self.clear,
        };
        let report = SyncRunner::new(engine, &bucket, options)
            .run(assets)
            .with_context(|| format!("sync into {} failed", self.bucket.display()))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }
        Ok(())
    }
}

fn print_report(report: &SyncReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };

    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Uploaded { path, reason } => {
                println!("{prefix}{} {path} ({reason})", "✎".green().bold());
            }
            FileOutcome::WouldUpload { path, reason } => {
                println!("{prefix}{} {path} ({reason})", "~".yellow().bold());
            }
            FileOutcome::Skipped { path, .. } => {
                println!("{prefix}{} {}", "·".dimmed(), path.to_string().dimmed());
            }
            FileOutcome::Deleted { path } | FileOutcome::WouldDelete { path } => {
                println!("{prefix}{} {path}", "✗".red().bold());
            }
        }
    }

    let mut summary = format!("{} uploaded, {} skipped", report.uploaded, report.skipped);
    if report.deleted > 0 {
        summary.push_str(&format!(", {} deleted", report.deleted));
    }
    println!(
        "{prefix}{summary} in {:.2}s",
        report.elapsed.as_secs_f64()
    );
}
