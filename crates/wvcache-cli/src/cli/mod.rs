//! CLI for the wvcache resource cache.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wvcache_core::config::{self, CacheConfig};

use commands::{run_fetch, run_manifest, run_mark, run_path, run_prefetch};

/// Top-level CLI for the wvcache resource cache.
#[derive(Debug, Parser)]
#[command(name = "wvcache")]
#[command(about = "wvcache: manifest-driven prefetch cache for intercepted resource requests", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/wvcache/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch a manifest and warm the cache with every resource it lists.
    Prefetch {
        /// Manifest URL, or a path to a local manifest file.
        manifest: String,
    },

    /// List the resource URLs in a manifest.
    Manifest {
        /// Manifest URL, or a path to a local manifest file.
        source: String,
    },

    /// Run one interception for a custom-scheme URL, as the renderer would.
    Fetch {
        /// Request URL, e.g. custom-https://host/app.js.
        url: String,

        /// Write the body to this file instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print the response head (status, headers, source) to stderr.
        #[arg(short, long)]
        include: bool,
    },

    /// Print the disk cache path for a resource URL.
    Path {
        /// Resource URL (without the scheme marker).
        url: String,
    },

    /// Print a URL with the scheme marker prepended.
    Mark {
        /// Plain http/https URL.
        url: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_deref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Prefetch { manifest } => run_prefetch(&cfg, &manifest).await?,
            CliCommand::Manifest { source } => run_manifest(&cfg, &source).await?,
            CliCommand::Fetch {
                url,
                output,
                include,
            } => run_fetch(&cfg, &url, output.as_deref(), include).await?,
            CliCommand::Path { url } => run_path(&cfg, &url)?,
            CliCommand::Mark { url } => run_mark(&cfg, &url),
        }

        Ok(())
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<CacheConfig> {
    match path {
        Some(path) => config::load_from_path(path),
        None => config::load_or_init(),
    }
}

/// True when `source` names a remote manifest rather than a local file.
pub(crate) fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[cfg(test)]
mod tests;
