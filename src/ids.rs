//! Content hashing and deterministic point identifiers.
//!
//! Qdrant only accepts UUIDs (or integers) as point ids, so semantic keys
//! like `acme-corp#3` are folded into UUIDv5 under a configured namespace.
//! Re-deriving the same key yields the same id, which is what turns every
//! upsert into an overwrite instead of a duplicate.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hex-encoded SHA-256 of raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Deterministic UUIDv5 for a semantic point key.
pub fn point_id(namespace: &Uuid, key: &str) -> Uuid {
    Uuid::new_v5(namespace, key.as_bytes())
}

/// Semantic key of a document's item point.
pub fn item_key(slug: &str) -> String {
    slug.to_string()
}

/// Semantic key of one chunk's point, also the prefix of its cache key.
pub fn chunk_key(slug: &str, chunk_id: usize) -> String {
    format!("{}#{}", slug, chunk_id)
}
