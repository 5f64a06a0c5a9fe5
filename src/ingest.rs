//! Ingestion pipeline orchestration.
//!
//! Coordinates the full run: load documents → validate → build item and
//! chunk records → resolve embeddings through the cache → upsert into
//! Qdrant. Point ids are deterministic, so a rerun after a partial failure
//! repairs the index instead of duplicating it. The embedding cache file is
//! the only state carried between runs.

use anyhow::{bail, Result};
use std::path::Path;

use crate::chunk::chunk_body;
use crate::config::{ChunkingConfig, Config, EmbeddingConfig};
use crate::documents;
use crate::embed_cache::{cache_key, EmbedCache};
use crate::embedding::EmbeddingClient;
use crate::ids;
use crate::models::{ChunkRecord, DocType, Document, ItemRecord};
use crate::qdrant::{Point, QdrantClient, CHUNKS_VECTOR_NAME, ITEMS_VECTOR_DIM, ITEMS_VECTOR_NAME};

/// One chunk record plus the exact text submitted for embedding.
struct ChunkJob {
    record: ChunkRecord,
    input: String,
}

pub async fn run_ingest(
    config: &Config,
    dry_run: bool,
    embed_only: bool,
    limit: Option<usize>,
) -> Result<()> {
    let mut docs = documents::load_documents(&config.content)?;
    if let Some(lim) = limit {
        docs.truncate(lim);
    }
    documents::validate_all(&docs)?;

    let items: Vec<ItemRecord> = docs.iter().map(ItemRecord::from_document).collect();
    let jobs = build_chunk_jobs(&docs, &config.chunking);

    if dry_run {
        write_dumps(&config.export.dump_dir, &items, &jobs)?;
        println!("ingest (dry-run)");
        println!("  documents: {}", docs.len());
        println!("  chunks: {}", jobs.len());
        println!("  dumps: {}", config.export.dump_dir.display());
        return Ok(());
    }

    let client = EmbeddingClient::new(&config.embedding)?;
    let mut cache = EmbedCache::open(&config.embedding.cache_path)?;
    let (vectors, cache_hits, cache_misses) =
        resolve_embeddings(&client, &mut cache, &config.embedding, &jobs).await?;

    if embed_only {
        println!("ingest (embed-only)");
        println!("  documents: {}", docs.len());
        println!("  chunks: {}", jobs.len());
        println!("  cache hits: {}", cache_hits);
        println!("  cache misses: {}", cache_misses);
        println!("ok");
        return Ok(());
    }

    let qdrant = QdrantClient::new(&config.qdrant)?;
    qdrant
        .ensure_collection(
            &config.qdrant.items_collection,
            ITEMS_VECTOR_NAME,
            ITEMS_VECTOR_DIM,
        )
        .await?;
    qdrant
        .ensure_collection(
            &config.qdrant.chunks_collection,
            CHUNKS_VECTOR_NAME,
            config.embedding.dims,
        )
        .await?;

    let ns = &config.qdrant.namespace_uuid;

    let mut item_points = Vec::with_capacity(items.len());
    for item in &items {
        let id = ids::point_id(ns, &ids::item_key(&item.slug));
        item_points.push(Point::item(id, serde_json::to_value(item)?));
    }

    let mut chunk_points = Vec::with_capacity(jobs.len());
    for (job, vector) in jobs.iter().zip(&vectors) {
        let id = ids::point_id(ns, &ids::chunk_key(&job.record.slug, job.record.chunk_id));
        chunk_points.push(Point::chunk(id, vector, serde_json::to_value(&job.record)?));
    }

    let items_written = qdrant
        .upsert_points(&config.qdrant.items_collection, &item_points)
        .await?;
    let chunks_written = qdrant
        .upsert_points(&config.qdrant.chunks_collection, &chunk_points)
        .await?;

    println!("ingest");
    println!("  documents: {}", docs.len());
    println!("  chunks: {}", jobs.len());
    println!("  cache hits: {}", cache_hits);
    println!("  cache misses: {}", cache_misses);
    println!("  item points upserted: {}", items_written);
    println!("  chunk points upserted: {}", chunks_written);
    println!("ok");

    Ok(())
}

/// Chunk every retrieval-visible document, carrying the denormalized
/// lookup metadata into each record. Chunk ids are zero-based and
/// contiguous within a document.
fn build_chunk_jobs(docs: &[Document], chunking: &ChunkingConfig) -> Vec<ChunkJob> {
    let mut jobs = Vec::new();
    for doc in docs {
        if !doc.rag_visible() {
            continue;
        }
        let limits = chunking.limits_for(doc.doc_type);
        for (chunk_id, piece) in chunk_body(&doc.body, &limits).into_iter().enumerate() {
            let record = ChunkRecord {
                doc_type: doc.doc_type.as_str().to_string(),
                slug: doc.slug.clone(),
                chunk_id,
                section: piece.section,
                text: piece.text,
                title: doc.title.clone(),
                tags: doc.tags.clone(),
                company: doc.company.clone(),
                role: doc.role.clone(),
            };
            let input = embed_input(doc, &record.text);
            jobs.push(ChunkJob { record, input });
        }
    }
    jobs
}

/// Text submitted to the embeddings API: a short identity prefix ahead of
/// the chunk body, so similar chunks from different contexts embed apart.
fn embed_input(doc: &Document, text: &str) -> String {
    let prefix = match (doc.doc_type, &doc.company, &doc.role) {
        (DocType::Experience, Some(company), Some(role)) => {
            format!("{} ({} at {})", doc.title, role, company)
        }
        _ => doc.title.clone(),
    };
    format!("{}\n\n{}", prefix, text)
}

/// One cache key per job, in job order.
fn job_keys(config: &EmbeddingConfig, jobs: &[ChunkJob]) -> Vec<String> {
    jobs.iter()
        .map(|job| {
            cache_key(
                &job.record.slug,
                job.record.chunk_id,
                &config.model,
                config.dims,
                &job.input,
            )
        })
        .collect()
}

/// Split keys into cached vectors and the indices still needing an API call.
fn lookup_cached(cache: &EmbedCache, keys: &[String]) -> (Vec<Option<Vec<f32>>>, Vec<usize>) {
    let mut vectors = Vec::with_capacity(keys.len());
    let mut pending = Vec::new();
    for (i, key) in keys.iter().enumerate() {
        match cache.get(key) {
            Some(vector) => vectors.push(Some(vector.to_vec())),
            None => {
                vectors.push(None);
                pending.push(i);
            }
        }
    }
    (vectors, pending)
}

/// Resolve one vector per job, from cache where possible. Fresh vectors
/// are inserted into the cache only after the API call succeeds, and the
/// cache is flushed once when anything new was computed.
///
/// Returns `(vectors, cache_hits, cache_misses)`.
async fn resolve_embeddings(
    client: &EmbeddingClient,
    cache: &mut EmbedCache,
    config: &EmbeddingConfig,
    jobs: &[ChunkJob],
) -> Result<(Vec<Vec<f32>>, usize, usize)> {
    let keys = job_keys(config, jobs);
    let (mut vectors, pending) = lookup_cached(cache, &keys);

    let hits = jobs.len() - pending.len();
    let misses = pending.len();

    if !pending.is_empty() {
        let texts: Vec<String> = pending.iter().map(|&i| jobs[i].input.clone()).collect();
        let fresh = client.embed_texts(&texts).await?;
        for (&i, vector) in pending.iter().zip(fresh.into_iter()) {
            if vector.len() != config.dims {
                bail!(
                    "Embedding dimension mismatch: API returned {} dims, config expects {}",
                    vector.len(),
                    config.dims
                );
            }
            cache.insert(keys[i].clone(), vector.clone());
            vectors[i] = Some(vector);
        }
        cache.flush()?;
    }

    let resolved: Option<Vec<Vec<f32>>> = vectors.into_iter().collect();
    let resolved = resolved.ok_or_else(|| anyhow::anyhow!("Unresolved chunk embedding"))?;
    Ok((resolved, hits, misses))
}

/// Debug dumps of what a real run would build, for inspection without
/// touching the network.
fn write_dumps(dump_dir: &Path, items: &[ItemRecord], jobs: &[ChunkJob]) -> Result<()> {
    std::fs::create_dir_all(dump_dir)?;

    let items_json = serde_json::to_string_pretty(items)?;
    std::fs::write(dump_dir.join("items.json"), items_json)?;

    let chunks: Vec<&ChunkRecord> = jobs.iter().map(|j| &j.record).collect();
    let chunks_json = serde_json::to_string_pretty(&chunks)?;
    std::fs::write(dump_dir.join("chunks.json"), chunks_json)?;

    Ok(())
}
