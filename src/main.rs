//! # Content Indexer CLI (`cidx`)
//!
//! The `cidx` binary drives the pipeline. It provides commands for corpus
//! validation, ingestion into Qdrant, and exporting the UI metadata JSON.
//!
//! ## Usage
//!
//! ```bash
//! cidx --config ./cidx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cidx validate` | Load the corpus and check frontmatter |
//! | `cidx ingest` | Chunk, embed, and upsert into Qdrant |
//! | `cidx ingest --dry-run` | Build records and write debug dumps only |
//! | `cidx ingest --embed-only` | Stop after filling the embedding cache |
//! | `cidx export` | Write the UI metadata JSON |
//!
//! ## Examples
//!
//! ```bash
//! # Check the corpus without touching the network
//! cidx validate --config ./cidx.toml
//!
//! # Inspect what a run would build
//! cidx ingest --dry-run --config ./cidx.toml
//!
//! # Warm the embedding cache before a full run
//! cidx ingest --embed-only --config ./cidx.toml
//!
//! # Full run: embed and upsert into Qdrant
//! cidx ingest --config ./cidx.toml
//!
//! # Write the artifacts JSON for the site
//! cidx export --config ./cidx.toml
//! ```

mod chunk;
mod config;
mod documents;
mod embed_cache;
mod embedding;
mod export;
mod frontmatter;
mod ids;
mod ingest;
mod models;
mod qdrant;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Content Indexer CLI, a deterministic ingestion pipeline for a Markdown
/// content corpus.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `cidx.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "cidx",
    about = "Content Indexer: deterministic Markdown ingestion into Qdrant",
    version,
    long_about = "Content Indexer loads typed Markdown documents, validates their frontmatter, \
    chunks bodies along section boundaries, embeds chunks through an on-disk cache, and upserts \
    item and chunk points into Qdrant under content-derived UUIDs, so reruns converge on the \
    same index instead of duplicating it."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./cidx.toml`. All content, chunking, embedding, Qdrant,
    /// and export settings are read from this file.
    #[arg(long, global = true, default_value = "./cidx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Validate the content corpus.
    ///
    /// Loads every document, checks required frontmatter fields and type
    /// agreement, and prints per-type counts. Exits non-zero on the first
    /// invalid document. Never touches the network.
    Validate,

    /// Ingest the corpus into Qdrant.
    ///
    /// Loads and validates documents, chunks retrieval-visible bodies,
    /// resolves embeddings through the on-disk cache, and upserts item and
    /// chunk points. Point ids derive from slugs, so reruns update in place.
    Ingest {
        /// Build records and write debug dumps without embedding or upserting.
        #[arg(long)]
        dry_run: bool,

        /// Stop after resolving embeddings. Fills the cache, skips Qdrant.
        #[arg(long)]
        embed_only: bool,

        /// Maximum number of documents to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Write the UI metadata JSON.
    ///
    /// Collects every UI-visible document (never background) into a single
    /// JSON file for the site to render. Requires neither Qdrant nor an
    /// embedding key.
    Export,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Validate => {
            documents::run_validate(&cfg)?;
        }
        Commands::Ingest {
            dry_run,
            embed_only,
            limit,
        } => {
            ingest::run_ingest(&cfg, dry_run, embed_only, limit).await?;
        }
        Commands::Export => {
            export::run_export(&cfg)?;
        }
    }

    Ok(())
}
