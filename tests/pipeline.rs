use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use content_indexer::embed_cache::cache_key;
use serde_json::{json, Value};

fn cidx_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("cidx");
    path
}

const ACME: &str = r#"---
type: experience
title: Platform Engineering at Acme
summary: Rebuilt the ingestion platform.
company: Acme Corp
role: Staff Engineer
period: 2020-2023
tags: [rust, infra]
visibleIn: [rag, artifacts, cv]
updated: 2024-02-10
---

# Overview

Led the team that rebuilt the ingestion platform in Rust.

## Impact

Cut indexing latency from hours to minutes.
"#;

const INDEXER: &str = r#"---
title: Content Indexer
summary: A deterministic Markdown indexing pipeline.
tags: [rust, qdrant]
visibleIn: [rag, artifacts]
links: ["https://example.com/indexer"]
---

Indexes Markdown into Qdrant with content-derived ids.
"#;

const CV_ONLY: &str = r#"---
title: Internal Tooling
summary: Assorted internal tools.
tags: [tooling]
visibleIn: [cv]
---

Only the CV ever shows this one.
"#;

const ROOTS: &str = r#"---
title: Early Computing
summary: How it started.
tags: [history]
visibleIn: [rag, artifacts]
---

Started with a hand-me-down machine and a BASIC manual.
"#;

const DRAFT: &str = r#"---
title: Unfinished
summary: Not ready.
tags: [draft]
visibleIn: [rag]
---

Still cooking.
"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let content = root.join("content");
    fs::create_dir_all(content.join("experience")).unwrap();
    fs::create_dir_all(content.join("projects")).unwrap();
    fs::create_dir_all(content.join("background")).unwrap();

    fs::write(content.join("experience").join("acme.md"), ACME).unwrap();
    fs::write(content.join("projects").join("indexer.md"), INDEXER).unwrap();
    fs::write(content.join("projects").join("cv-only.md"), CV_ONLY).unwrap();
    fs::write(content.join("projects").join("_draft.md"), DRAFT).unwrap();
    fs::write(content.join("background").join("roots.md"), ROOTS).unwrap();

    // Qdrant points at a dead port: any accidental network call fails loudly.
    let config_content = format!(
        r#"[content]
root = "{root}/content"

[embedding]
model = "text-embedding-3-small"
dims = 8
cache_path = "{root}/out/embed-cache.json"

[qdrant]
url = "http://127.0.0.1:1"

[export]
output_path = "{root}/out/artifacts.json"
ui_path = "{root}/site/artifacts.json"
dump_dir = "{root}/out/debug"
"#,
        root = root.display()
    );

    let config_path = root.join("cidx.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_cidx_env(
    config_path: &Path,
    args: &[&str],
    env: &[(&str, &str)],
) -> (String, String, bool) {
    let binary = cidx_binary();
    let mut cmd = Command::new(&binary);
    cmd.arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .env_remove("QDRANT_API_KEY");
    for (key, value) in env {
        cmd.env(key, value);
    }
    let output = cmd
        .output()
        .unwrap_or_else(|e| panic!("Failed to run cidx binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn run_cidx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    run_cidx_env(config_path, args, &[])
}

fn read_json(path: &Path) -> Value {
    let raw = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn test_validate_reports_counts() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_cidx(&config_path, &["validate"]);
    assert!(success, "validate failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("experience: 1"));
    assert!(stdout.contains("project: 2"));
    assert!(stdout.contains("background: 1"));
    assert!(stdout.contains("retrieval-visible: 3"));
    assert!(stdout.contains("ui-visible: 2"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_validate_missing_required_field() {
    let (tmp, config_path) = setup_test_env();

    let acme = tmp.path().join("content").join("experience").join("acme.md");
    fs::write(&acme, ACME.replace("role: Staff Engineer\n", "")).unwrap();

    let (_, stderr, success) = run_cidx(&config_path, &["validate"]);
    assert!(!success, "validate should fail with a missing field");
    assert!(
        stderr.contains("required field 'role'") && stderr.contains("'acme'"),
        "Should name the document and field, got: {}",
        stderr
    );
}

#[test]
fn test_validate_type_mismatch() {
    let (tmp, config_path) = setup_test_env();

    let indexer = tmp.path().join("content").join("projects").join("indexer.md");
    let mismatched = INDEXER.replace(
        "title: Content Indexer",
        "type: experience\ntitle: Content Indexer",
    );
    fs::write(&indexer, mismatched).unwrap();

    let (_, stderr, success) = run_cidx(&config_path, &["validate"]);
    assert!(!success, "validate should fail on a type mismatch");
    assert!(
        stderr.contains("does not match its directory"),
        "Should report the mismatch, got: {}",
        stderr
    );
}

#[test]
fn test_validate_duplicate_slug() {
    let (tmp, config_path) = setup_test_env();

    // Same slug in two type directories.
    let dup = tmp.path().join("content").join("background").join("indexer.md");
    fs::write(&dup, ROOTS).unwrap();

    let (_, stderr, success) = run_cidx(&config_path, &["validate"]);
    assert!(!success, "validate should fail on a duplicate slug");
    assert!(
        stderr.contains("duplicate slug 'indexer'"),
        "Should name the slug, got: {}",
        stderr
    );
}

#[test]
fn test_ingest_dry_run_writes_dumps() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_cidx(&config_path, &["ingest", "--dry-run"]);
    assert!(success, "dry-run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("documents: 4"));
    assert!(stdout.contains("chunks: 4"));

    let dump_dir = tmp.path().join("out").join("debug");
    let items = read_json(&dump_dir.join("items.json"));
    let slugs: Vec<&str> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["acme", "cv-only", "indexer", "roots"]);

    let chunks = read_json(&dump_dir.join("chunks.json"));
    let chunks = chunks.as_array().unwrap();
    assert_eq!(chunks.len(), 4);
    // acme has two sections, so two chunks with contiguous ids.
    let acme_ids: Vec<u64> = chunks
        .iter()
        .filter(|c| c["slug"] == "acme")
        .map(|c| c["chunkId"].as_u64().unwrap())
        .collect();
    assert_eq!(acme_ids, vec![0, 1]);
    // cv-only is not retrieval-visible and must not be chunked.
    assert!(chunks.iter().all(|c| c["slug"] != "cv-only"));
    assert!(chunks.iter().all(|c| c["slug"] != "draft"));
}

#[test]
fn test_dry_run_deterministic() {
    let (tmp, config_path) = setup_test_env();

    let items_path = tmp.path().join("out").join("debug").join("items.json");

    let (_, _, success1) = run_cidx(&config_path, &["ingest", "--dry-run"]);
    assert!(success1);
    let first = fs::read(&items_path).unwrap();

    let (_, _, success2) = run_cidx(&config_path, &["ingest", "--dry-run"]);
    assert!(success2);
    let second = fs::read(&items_path).unwrap();

    assert_eq!(first, second, "Dumps should be identical across runs");
}

#[test]
fn test_ingest_limit_truncates() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) =
        run_cidx(&config_path, &["ingest", "--dry-run", "--limit", "2"]);
    assert!(success);
    // Documents sort by slug: acme and cv-only survive the limit.
    assert!(stdout.contains("documents: 2"));
    assert!(stdout.contains("chunks: 2"));
}

#[test]
fn test_ingest_without_key_fails_fast() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_cidx(&config_path, &["ingest"]);
    assert!(!success, "ingest without an API key should fail");
    assert!(
        stderr.contains("OPENAI_API_KEY"),
        "Should name the missing variable, got: {}",
        stderr
    );
}

#[test]
fn test_ingest_validates_before_embedding() {
    let (tmp, config_path) = setup_test_env();

    let acme = tmp.path().join("content").join("experience").join("acme.md");
    fs::write(&acme, ACME.replace("role: Staff Engineer\n", "")).unwrap();

    // No API key is set, so reaching the embedding stage would complain
    // about OPENAI_API_KEY. A broken document must fail before that.
    let (_, stderr, success) = run_cidx(&config_path, &["ingest"]);
    assert!(!success, "ingest with an invalid document should fail");
    assert!(
        stderr.contains("required field 'role'"),
        "Should fail on validation, got: {}",
        stderr
    );
    assert!(
        !stderr.contains("OPENAI_API_KEY"),
        "Validation should run before the embedding client is built, got: {}",
        stderr
    );
}

#[test]
fn test_embed_only_serves_from_cache() {
    let (tmp, config_path) = setup_test_env();

    // First pass: dry-run dumps tell us exactly which chunks a run builds.
    let (_, _, success) = run_cidx(&config_path, &["ingest", "--dry-run"]);
    assert!(success);

    let chunks = read_json(&tmp.path().join("out").join("debug").join("chunks.json"));
    let mut entries = serde_json::Map::new();
    for chunk in chunks.as_array().unwrap() {
        let slug = chunk["slug"].as_str().unwrap();
        let chunk_id = chunk["chunkId"].as_u64().unwrap() as usize;
        let text = chunk["text"].as_str().unwrap();
        let title = chunk["title"].as_str().unwrap();
        let input = if chunk["type"] == "experience" {
            format!(
                "{} ({} at {})\n\n{}",
                title,
                chunk["role"].as_str().unwrap(),
                chunk["company"].as_str().unwrap(),
                text
            )
        } else {
            format!("{}\n\n{}", title, text)
        };
        let key = cache_key(slug, chunk_id, "text-embedding-3-small", 8, &input);
        entries.insert(
            key,
            json!({"embedding": vec![0.25f32; 8], "createdAt": "2024-01-01T00:00:00Z"}),
        );
    }
    let cache_path = tmp.path().join("out").join("embed-cache.json");
    fs::write(&cache_path, serde_json::to_string_pretty(&entries).unwrap()).unwrap();

    // Second pass: everything resolves from the cache, no API call happens,
    // so the dummy key is never sent anywhere.
    let (stdout, stderr, success) = run_cidx_env(
        &config_path,
        &["ingest", "--embed-only"],
        &[("OPENAI_API_KEY", "test-key")],
    );
    assert!(success, "embed-only failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("cache hits: 4"));
    assert!(stdout.contains("cache misses: 0"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_export_writes_ui_metadata() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_cidx(&config_path, &["export"]);
    assert!(success, "export failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stderr.contains("Exported 2 items"));

    let export = read_json(&tmp.path().join("out").join("artifacts.json"));
    assert!(export["generatedAt"].is_string());
    let items = export["items"].as_array().unwrap();
    let slugs: Vec<&str> = items.iter().map(|i| i["slug"].as_str().unwrap()).collect();
    assert_eq!(slugs, vec!["acme", "indexer"]);
    assert_eq!(items[0]["company"], "Acme Corp");
    assert_eq!(items[0]["uiVisible"], true);

    // The optional UI copy matches the primary file byte for byte.
    let primary = fs::read(tmp.path().join("out").join("artifacts.json")).unwrap();
    let copy = fs::read(tmp.path().join("site").join("artifacts.json")).unwrap();
    assert_eq!(primary, copy);
}

#[test]
fn test_export_excludes_background() {
    let (tmp, config_path) = setup_test_env();

    let (_, _, success) = run_cidx(&config_path, &["export"]);
    assert!(success);

    let export = read_json(&tmp.path().join("out").join("artifacts.json"));
    let items = export["items"].as_array().unwrap();
    // roots declares artifacts visibility but background never ships to the UI.
    assert!(items.iter().all(|i| i["slug"] != "roots"));
    assert!(items.iter().all(|i| i["slug"] != "cv-only"));
}

#[test]
fn test_missing_config_fails() {
    let (tmp, _) = setup_test_env();

    let missing = tmp.path().join("nope.toml");
    let (_, stderr, success) = run_cidx(&missing, &["validate"]);
    assert!(!success, "Missing config should fail");
    assert!(
        stderr.contains("Failed to read config file"),
        "Should report the config read failure, got: {}",
        stderr
    );
}
