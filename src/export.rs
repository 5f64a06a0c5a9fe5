//! UI metadata export.
//!
//! Writes the artifacts JSON the UI renders: every artifacts-visible,
//! non-background item, sorted by slug, wrapped with a generation
//! timestamp. Optionally duplicates the file into the UI's static asset
//! directory. Runs entirely offline.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::config::Config;
use crate::documents;
use crate::models::{Document, ItemRecord};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportData {
    generated_at: DateTime<Utc>,
    items: Vec<ItemRecord>,
}

/// Select the documents the UI may show.
///
/// Background documents never appear here, whatever their `visibleIn`
/// says. Input order (slug order) is preserved.
fn collect_items(docs: &[Document]) -> Vec<ItemRecord> {
    docs.iter()
        .filter(|d| d.ui_visible())
        .map(ItemRecord::from_document)
        .collect()
}

/// Export UI-visible items to the configured path, plus the optional UI
/// static-asset copy.
pub fn run_export(config: &Config) -> Result<()> {
    let docs = documents::load_documents(&config.content)?;
    documents::validate_all(&docs)?;

    let items = collect_items(&docs);
    let item_count = items.len();

    let data = ExportData {
        generated_at: Utc::now(),
        items,
    };
    let json = serde_json::to_string_pretty(&data)?;

    write_json(&config.export.output_path, &json)?;
    eprintln!(
        "Exported {} items to {}",
        item_count,
        config.export.output_path.display()
    );

    if let Some(ui_path) = &config.export.ui_path {
        write_json(ui_path, &json)?;
        eprintln!("Copied export to {}", ui_path.display());
    }

    Ok(())
}

fn write_json(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    Ok(())
}
