//! On-disk cache of computed embedding vectors.
//!
//! Keys are content-addressed: slug, chunk id, model, dimension count, and a
//! hash of the exact text sent to the API. Any change to chunk text or model
//! settings produces a fresh key, so stale vectors are never looked up again
//! and eviction is unnecessary. The file is a plain JSON map, safe to delete.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::ids::{chunk_key, sha256_hex};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    embedding: Vec<f32>,
    created_at: DateTime<Utc>,
}

/// Cache key for one chunk's vector.
pub fn cache_key(slug: &str, chunk_id: usize, model: &str, dims: usize, input: &str) -> String {
    format!(
        "{}:{}:{}:{}",
        chunk_key(slug, chunk_id),
        model,
        dims,
        sha256_hex(input.as_bytes())
    )
}

/// Key-value store of embedding vectors, held in memory and written back
/// on [`EmbedCache::flush`].
#[derive(Debug)]
pub struct EmbedCache {
    path: Option<PathBuf>,
    entries: HashMap<String, CacheEntry>,
    dirty: bool,
}

impl EmbedCache {
    /// Open a file-backed cache, starting empty when the file is absent.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read embedding cache: {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Malformed embedding cache: {}", path.display()))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
            dirty: false,
        })
    }

    /// Cache with no backing file. Lookups and inserts behave as in the
    /// file-backed cache; [`EmbedCache::flush`] is a no-op.
    #[allow(dead_code)]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: HashMap::new(),
            dirty: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&[f32]> {
        self.entries.get(key).map(|e| e.embedding.as_slice())
    }

    pub fn insert(&mut self, key: String, embedding: Vec<f32>) {
        self.entries.insert(
            key,
            CacheEntry {
                embedding,
                created_at: Utc::now(),
            },
        );
        self.dirty = true;
    }

    /// Write the cache to disk if anything was inserted since the last
    /// flush. Parent directories are created as needed.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(&self.entries)?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write embedding cache: {}", path.display()))?;
        }
        self.dirty = false;
        Ok(())
    }
}
