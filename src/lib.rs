//! # Content Indexer
//!
//! A deterministic pipeline that turns a Markdown content corpus into a
//! Qdrant retrieval index and a UI metadata export.
//!
//! Content Indexer loads typed Markdown documents (experience, projects,
//! background), validates their frontmatter, chunks bodies along section
//! boundaries, embeds the chunks through an on-disk cache, and upserts
//! item and chunk points into Qdrant under content-derived UUIDs, so
//! reruns converge on the same index instead of duplicating it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌─────────────┐
//! │   Markdown   │──▶│  Pipeline   │──▶│   Qdrant    │
//! │ +frontmatter │   │ Chunk+Embed │   │ items+chunks│
//! └──────────────┘   └──────┬──────┘   └─────────────┘
//!                           │
//!                           ▼
//!                    ┌─────────────┐
//!                    │ UI metadata │
//!                    │    JSON     │
//!                    └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cidx validate                 # check the corpus
//! cidx ingest --dry-run         # build records, write debug dumps
//! cidx ingest                   # embed and upsert into Qdrant
//! cidx export                   # write UI metadata JSON
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`frontmatter`] | Frontmatter block parsing |
//! | [`documents`] | Corpus loading and validation |
//! | [`chunk`] | Section-aware text chunking |
//! | [`ids`] | Deterministic point ids |
//! | [`embedding`] | Embeddings API client |
//! | [`embed_cache`] | On-disk embedding cache |
//! | [`qdrant`] | Qdrant REST client |
//! | [`ingest`] | Pipeline orchestration |
//! | [`export`] | UI metadata export |

pub mod chunk;
pub mod config;
pub mod documents;
pub mod embed_cache;
pub mod embedding;
pub mod export;
pub mod frontmatter;
pub mod ids;
pub mod ingest;
pub mod models;
pub mod qdrant;
