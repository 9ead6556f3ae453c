//! `collectfast cache` — inspect or reset the shared lookup cache.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use collectfast_core::{CacheBackend, DestinationPath, RemoteMetadata};
use collectfast_sync::{cache_key, LookupCache};

/// Subcommands for `collectfast cache`.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Print the shared cache key for each destination path.
    Key(KeysArgs),
    /// Show what the file cache holds for each destination path.
    Inspect(KeysArgs),
    /// Remove every entry from the file cache.
    Clear,
}

#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Bucket keys, e.g. `static/css/app.css`.
    #[arg(required = true)]
    pub paths: Vec<String>,
}

impl KeysArgs {
    fn destinations(&self) -> Result<Vec<DestinationPath>> {
        self.paths
            .iter()
            .map(|p| DestinationPath::new(p.as_str()).with_context(|| format!("bad path '{p}'")))
            .collect()
    }
}

pub fn run(command: CacheCommand) -> Result<()> {
    match command {
        CacheCommand::Key(args) => key(args),
        CacheCommand::Inspect(args) => inspect(args),
        CacheCommand::Clear => clear(),
    }
}

fn key(args: KeysArgs) -> Result<()> {
    let (_, config) = super::load_config()?;
    for path in args.destinations()? {
        println!("{}", cache_key(&config.cache.key_prefix, &path));
    }
    Ok(())
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "destination")]
    destination: String,
    #[tabled(rename = "key")]
    key: String,
    #[tabled(rename = "cached")]
    cached: String,
}

fn inspect(args: KeysArgs) -> Result<()> {
    let (home, config) = super::load_config()?;
    if config.cache.backend != CacheBackend::File {
        println!(
            "{} cache backend is not 'file'; nothing persists between runs",
            "!".yellow().bold()
        );
        return Ok(());
    }

    let file_cache = super::file_cache(&home, &config);
    let mut lookup = LookupCache::new(&file_cache, config.cache.key_prefix.clone());
    let rows: Vec<Row> = args
        .destinations()?
        .into_iter()
        .map(|path| {
            let cached = match lookup.get(&path) {
                Some(RemoteMetadata::Present { etag }) => etag.to_string(),
                Some(RemoteMetadata::Absent) => "absent".to_string(),
                None => "—".to_string(),
            };
            Row {
                key: lookup.key_for(&path),
                destination: path.to_string(),
                cached,
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn clear() -> Result<()> {
    let (home, config) = super::load_config()?;
    let file_cache = super::file_cache(&home, &config);
    file_cache
        .clear()
        .with_context(|| format!("failed to clear {}", file_cache.dir().display()))?;
    println!("{} cleared {}", "✓".green().bold(), file_cache.dir().display());
    Ok(())
}
