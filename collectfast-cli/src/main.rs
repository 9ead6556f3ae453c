//! collectfast — skip unchanged static assets when syncing to a bucket.
//!
//! # Usage
//!
//! ```text
//! collectfast sync <source> --bucket <dir> [--prefix static/] [--ignore-etag]
//!                  [--dry-run] [--clear] [--json] [--cache file|memory|none]
//! collectfast cache key <destination>...
//! collectfast cache inspect <destination>...
//! collectfast cache clear
//! ```

mod commands;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use collectfast_core::CacheBackend;
use commands::{cache::CacheCommand, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "collectfast",
    version,
    about = "Sync static assets to a bucket, skipping files whose ETag already matches",
    long_about = None,
)]
struct Cli {
    /// Log decisions and cache activity to stderr (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload changed files from a collected static tree.
    Sync(SyncArgs),

    /// Inspect or reset the shared lookup cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

// ---------------------------------------------------------------------------
// CacheBackend argument parsing
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `CacheBackend` from CLI args.
#[derive(Debug, Clone, Copy)]
pub struct CacheBackendArg(pub CacheBackend);

impl FromStr for CacheBackendArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Self(CacheBackend::File)),
            "memory" => Ok(Self(CacheBackend::Memory)),
            "none" => Ok(Self(CacheBackend::None)),
            other => Err(format!(
                "unknown cache backend '{other}'; expected: file, memory, none"
            )),
        }
    }
}

impl fmt::Display for CacheBackendArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            CacheBackend::File => write!(f, "file"),
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::None => write!(f, "none"),
        }
    }
}

impl From<CacheBackendArg> for CacheBackend {
    fn from(arg: CacheBackendArg) -> Self {
        arg.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Cache { command } => commands::cache::run(command),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
