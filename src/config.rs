use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::chunk::ChunkLimits;
use crate::models::DocType;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub content: ContentConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub qdrant: QdrantConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// Directory holding the `experience/`, `projects/`, and `background/`
    /// subdirectories.
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default = "default_exclude_globs")]
    pub exclude_globs: Vec<String>,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string()]
}

fn default_exclude_globs() -> Vec<String> {
    // Underscore-prefixed files are drafts.
    vec!["**/_*.md".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    #[serde(default = "default_background_max_chars")]
    pub background_max_chars: usize,
    #[serde(default = "default_background_min_chars")]
    pub background_min_chars: usize,
    #[serde(default = "default_merge_tolerance")]
    pub merge_tolerance: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1200,
            min_chars: 240,
            background_max_chars: 700,
            background_min_chars: 140,
            merge_tolerance: 1.25,
        }
    }
}

fn default_max_chars() -> usize {
    1200
}
fn default_min_chars() -> usize {
    240
}
fn default_background_max_chars() -> usize {
    700
}
fn default_background_min_chars() -> usize {
    140
}
fn default_merge_tolerance() -> f64 {
    1.25
}

impl ChunkingConfig {
    /// Background notes get narrower chunks than experience and project
    /// write-ups.
    pub fn limits_for(&self, doc_type: DocType) -> ChunkLimits {
        match doc_type {
            DocType::Background => ChunkLimits {
                max_chars: self.background_max_chars,
                min_chars: self.background_min_chars,
                merge_tolerance: self.merge_tolerance,
            },
            _ => ChunkLimits {
                max_chars: self.max_chars,
                min_chars: self.min_chars,
                merge_tolerance: self.merge_tolerance,
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            dims: default_dims(),
            base_url: default_base_url(),
            batch_size: 64,
            max_retries: 3,
            backoff_base_ms: 500,
            timeout_secs: 30,
            cache_path: default_cache_path(),
        }
    }
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    500
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_cache_path() -> PathBuf {
    PathBuf::from("./out/embed-cache.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct QdrantConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,
    #[serde(default = "default_items_collection")]
    pub items_collection: String,
    #[serde(default = "default_chunks_collection")]
    pub chunks_collection: String,
    /// Namespace for UUIDv5 point ids. Changing it re-keys every point.
    #[serde(default = "default_namespace")]
    pub namespace_uuid: Uuid,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            items_collection: default_items_collection(),
            chunks_collection: default_chunks_collection(),
            namespace_uuid: default_namespace(),
            batch_size: 64,
            max_retries: 3,
            backoff_base_ms: 500,
            timeout_secs: 30,
        }
    }
}

fn default_qdrant_url() -> String {
    "http://127.0.0.1:6333".to_string()
}
fn default_items_collection() -> String {
    "content_items_v1".to_string()
}
fn default_chunks_collection() -> String {
    "content_chunks_v1".to_string()
}
fn default_namespace() -> Uuid {
    Uuid::NAMESPACE_URL
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Optional second copy for the UI's static asset directory.
    #[serde(default)]
    pub ui_path: Option<PathBuf>,
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            ui_path: None,
            dump_dir: default_dump_dir(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("./out/artifacts.json")
}
fn default_dump_dir() -> PathBuf {
    PathBuf::from("./out/debug")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.max_chars == 0 || config.chunking.background_max_chars == 0 {
        anyhow::bail!("chunking.max_chars must be > 0");
    }
    if config.chunking.min_chars >= config.chunking.max_chars
        || config.chunking.background_min_chars >= config.chunking.background_max_chars
    {
        anyhow::bail!("chunking.min_chars must be < chunking.max_chars");
    }
    if config.chunking.merge_tolerance < 1.0 {
        anyhow::bail!("chunking.merge_tolerance must be >= 1.0");
    }

    // Validate embedding
    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    // Validate qdrant
    if config.qdrant.url.is_empty() {
        anyhow::bail!("qdrant.url must not be empty");
    }
    if config.qdrant.batch_size == 0 {
        anyhow::bail!("qdrant.batch_size must be > 0");
    }
    if config.qdrant.items_collection == config.qdrant.chunks_collection {
        anyhow::bail!("qdrant.items_collection and qdrant.chunks_collection must differ");
    }

    Ok(config)
}
