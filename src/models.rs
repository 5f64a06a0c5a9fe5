//! Core data models used throughout the indexer.
//!
//! These types represent the source documents, item records, and chunk
//! records that flow through the ingestion pipeline. Payload structs
//! serialize to camelCase because the chat service and UI read them as-is.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Content type of a source document, derived from the directory it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    Experience,
    Project,
    Background,
}

impl DocType {
    /// Directory name under the content root holding documents of this type.
    pub fn dir_name(&self) -> &'static str {
        match self {
            DocType::Experience => "experience",
            DocType::Project => "projects",
            DocType::Background => "background",
        }
    }

    /// Wire name used in payloads (`type` field).
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Experience => "experience",
            DocType::Project => "project",
            DocType::Background => "background",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "experience" => Some(DocType::Experience),
            "project" => Some(DocType::Project),
            "background" => Some(DocType::Background),
            _ => None,
        }
    }

    pub const ALL: [DocType; 3] = [DocType::Experience, DocType::Project, DocType::Background];
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed source document: frontmatter metadata plus markdown body.
///
/// Read once per run from `<content_root>/<type dir>/<slug>.md` and never
/// mutated. The raw file bytes feed `content_hash`; the parsed fields feed
/// both the item payload and the chunker.
#[derive(Debug, Clone)]
pub struct Document {
    pub slug: String,
    pub doc_type: DocType,
    /// Frontmatter `type`, when present. Must agree with the directory.
    pub declared_type: Option<String>,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub period: Option<String>,
    pub links: Option<Vec<String>>,
    pub visible_in: Vec<String>,
    pub body: String,
    /// SHA-256 hex of the raw file bytes.
    pub content_hash: String,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Whether chunks of this document belong in the retrieval index.
    pub fn rag_visible(&self) -> bool {
        self.visible_in.iter().any(|v| v == "rag")
    }

    /// Whether this document appears in the UI metadata export.
    ///
    /// Background documents are never exported, even when their
    /// `visibleIn` list says `artifacts`.
    pub fn ui_visible(&self) -> bool {
        self.doc_type != DocType::Background && self.visible_in.iter().any(|v| v == "artifacts")
    }
}

/// Metadata payload for one document in the items collection and the UI
/// export. One per document, overwritten idempotently on every run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    pub visible_in: Vec<String>,
    pub ui_visible: bool,
    pub content_hash: String,
    pub updated_at: DateTime<Utc>,
}

impl ItemRecord {
    pub fn from_document(doc: &Document) -> Self {
        ItemRecord {
            doc_type: doc.doc_type.as_str().to_string(),
            slug: doc.slug.clone(),
            title: doc.title.clone(),
            summary: doc.summary.clone(),
            tags: doc.tags.clone(),
            company: doc.company.clone(),
            role: doc.role.clone(),
            period: doc.period.clone(),
            links: doc.links.clone(),
            visible_in: doc.visible_in.clone(),
            ui_visible: doc.ui_visible(),
            content_hash: doc.content_hash.clone(),
            updated_at: doc.updated_at,
        }
    }
}

/// Payload for one text chunk in the chunks collection.
///
/// Carries denormalized lookup metadata (title, tags, company, role) so the
/// chat service can filter and attribute hits without a second fetch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub slug: String,
    pub chunk_id: usize,
    pub section: String,
    pub text: String,
    pub title: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}
