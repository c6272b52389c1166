//! # doc-index CLI (`dix`)
//!
//! The `dix` binary is the command-line shell over the indexing core: it
//! ingests a documents directory into a JSON vector index, searches it, prints
//! index statistics, and starts the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! dix --config ./config/dix.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dix ingest` | Rebuild the index from every supported document |
//! | `dix ingest --only-file <name>` | Re-embed one document and merge it into the index |
//! | `dix search "<query>"` | Rank indexed chunks against a query |
//! | `dix stats` | Summarize the index |
//! | `dix serve` | Start the JSON HTTP server |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use doc_index::config::{self, Config};
use doc_index::embedding::BackendChoice;
use doc_index::progress::ProgressMode;
use doc_index::{ingest, search, server, stats};

const DEFAULT_CONFIG_PATH: &str = "./config/dix.toml";

/// doc-index CLI: ingest documents into a vector index and search them.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the default file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "dix",
    version,
    about = "doc-index: document chunking, embedding, and similarity search"
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest documents into the index.
    ///
    /// Without `--only-file`, rebuilds the whole index. With it, re-embeds
    /// only the matching document and keeps every other record as is.
    Ingest {
        /// File name or path relative to the documents directory.
        #[arg(long)]
        only_file: Option<String>,

        /// Embedding backend for this run (overrides config and, for
        /// `--only-file`, the backend recorded in the index).
        #[arg(long, value_enum)]
        backend: Option<BackendChoice>,

        /// Progress output on stderr. Defaults to human when stderr is a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Search the index.
    Search {
        query: String,

        /// Number of results (defaults to `[retrieval].top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the raw JSON response.
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics.
    Stats,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

fn load(path: &Path) -> anyhow::Result<Config> {
    if path == Path::new(DEFAULT_CONFIG_PATH) && !path.exists() {
        tracing::debug!("no config file at {}, using defaults", path.display());
        return Ok(Config::minimal());
    }
    config::load_config(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = load(&cli.config)?;

    match cli.command {
        Commands::Ingest {
            only_file,
            backend,
            progress,
        } => {
            let progress = progress.unwrap_or_else(ProgressMode::default_for_tty);
            ingest::run_ingest(&cfg, only_file, backend, progress).await?;
        }
        Commands::Search { query, top_k, json } => {
            search::run_search(&cfg, &query, top_k, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
