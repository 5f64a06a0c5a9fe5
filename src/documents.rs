//! Corpus loading and validation.
//!
//! Documents live under `<content.root>/<type dir>/<slug>.md`. Loading walks
//! the three type directories with the configured include/exclude globs,
//! parses frontmatter, and returns [`Document`]s sorted by slug. Validation
//! is a separate step returning a typed [`ValidationError`]; the pipeline
//! fails fast on the first invalid document, and tests can assert which
//! document and field failed without matching message strings.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::{Config, ContentConfig};
use crate::frontmatter;
use crate::ids::sha256_hex;
use crate::models::{DocType, Document};

/// Why a document failed validation.
#[derive(Debug, PartialEq)]
pub enum ValidationError {
    MissingField {
        slug: String,
        field: &'static str,
    },
    TypeMismatch {
        slug: String,
        declared: String,
        directory: &'static str,
    },
    DuplicateSlug {
        slug: String,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingField { slug, field } => {
                write!(
                    f,
                    "document '{}': required field '{}' is missing or empty",
                    slug, field
                )
            }
            ValidationError::TypeMismatch {
                slug,
                declared,
                directory,
            } => {
                write!(
                    f,
                    "document '{}': declared type '{}' does not match its directory ('{}')",
                    slug, declared, directory
                )
            }
            ValidationError::DuplicateSlug { slug } => {
                write!(f, "duplicate slug '{}' across content directories", slug)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Load every document under the content root, sorted by slug.
///
/// Slugs double as point keys, so a slug appearing in two type directories
/// is rejected here rather than silently overwriting points.
pub fn load_documents(content: &ContentConfig) -> Result<Vec<Document>> {
    if !content.root.exists() {
        bail!("Content root does not exist: {}", content.root.display());
    }

    let include_set = build_globset(&content.include_globs)?;
    let mut excludes = vec!["**/.git/**".to_string(), "**/node_modules/**".to_string()];
    excludes.extend(content.exclude_globs.clone());
    let exclude_set = build_globset(&excludes)?;

    let mut documents = Vec::new();
    for doc_type in DocType::ALL {
        let dir = content.root.join(doc_type.dir_name());
        if !dir.exists() {
            continue;
        }
        for entry in WalkDir::new(&dir) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&content.root).unwrap_or(path);
            let rel_str = relative.to_string_lossy().to_string();
            if exclude_set.is_match(&rel_str) {
                continue;
            }
            if !include_set.is_match(&rel_str) {
                continue;
            }

            documents.push(read_document(path, doc_type)?);
        }
    }

    // Sort for deterministic ordering
    documents.sort_by(|a, b| a.slug.cmp(&b.slug));

    for pair in documents.windows(2) {
        if pair[0].slug == pair[1].slug {
            return Err(ValidationError::DuplicateSlug {
                slug: pair[0].slug.clone(),
            }
            .into());
        }
    }

    Ok(documents)
}

fn read_document(path: &Path, doc_type: DocType) -> Result<Document> {
    let raw =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content_hash = sha256_hex(&raw);
    let text = String::from_utf8_lossy(&raw).into_owned();

    let slug = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let (fm, body) = frontmatter::parse(&text);

    let updated_at = match fm.get_str("updated").and_then(|s| parse_updated(&s)) {
        Some(ts) => ts,
        None => file_mtime(path)?,
    };

    Ok(Document {
        slug,
        doc_type,
        declared_type: fm.get_str("type"),
        title: fm.get_str("title").unwrap_or_default(),
        summary: fm.get_str("summary").unwrap_or_default(),
        tags: fm.get_string_list("tags").unwrap_or_default(),
        company: fm.get_str("company"),
        role: fm.get_str("role"),
        period: fm.get_str("period"),
        links: fm.get_string_list("links"),
        visible_in: fm.get_string_list("visibleIn").unwrap_or_default(),
        body,
        content_hash,
        updated_at,
    })
}

/// Check every document, stopping at the first violation.
pub fn validate_all(documents: &[Document]) -> Result<(), ValidationError> {
    for doc in documents {
        validate(doc)?;
    }
    Ok(())
}

/// Load and validate the corpus, printing per-type counts. Exits non-zero
/// on the first invalid document without touching any network service.
pub fn run_validate(config: &Config) -> Result<()> {
    let docs = load_documents(&config.content)?;
    validate_all(&docs)?;

    println!("validate {}", config.content.root.display());
    for doc_type in DocType::ALL {
        let count = docs.iter().filter(|d| d.doc_type == doc_type).count();
        println!("  {}: {}", doc_type, count);
    }
    let rag = docs.iter().filter(|d| d.rag_visible()).count();
    let ui = docs.iter().filter(|d| d.ui_visible()).count();
    println!("  retrieval-visible: {}", rag);
    println!("  ui-visible: {}", ui);
    println!("ok");

    Ok(())
}

/// Check one document's required fields.
pub fn validate(doc: &Document) -> Result<(), ValidationError> {
    if let Some(declared) = &doc.declared_type {
        // An unknown declared type is a mismatch too.
        if DocType::from_str(declared) != Some(doc.doc_type) {
            return Err(ValidationError::TypeMismatch {
                slug: doc.slug.clone(),
                declared: declared.clone(),
                directory: doc.doc_type.as_str(),
            });
        }
    }

    required_str(&doc.slug, "title", &doc.title)?;
    required_str(&doc.slug, "summary", &doc.summary)?;
    required_list(&doc.slug, "tags", &doc.tags)?;
    required_list(&doc.slug, "visibleIn", &doc.visible_in)?;

    if doc.doc_type == DocType::Experience {
        required_opt(&doc.slug, "company", &doc.company)?;
        required_opt(&doc.slug, "role", &doc.role)?;
        required_opt(&doc.slug, "period", &doc.period)?;
    }

    Ok(())
}

fn required_str(slug: &str, field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField {
            slug: slug.to_string(),
            field,
        });
    }
    Ok(())
}

fn required_list(slug: &str, field: &'static str, values: &[String]) -> Result<(), ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::MissingField {
            slug: slug.to_string(),
            field,
        });
    }
    Ok(())
}

fn required_opt(
    slug: &str,
    field: &'static str,
    value: &Option<String>,
) -> Result<(), ValidationError> {
    match value {
        Some(v) => required_str(slug, field, v),
        None => Err(ValidationError::MissingField {
            slug: slug.to_string(),
            field,
        }),
    }
}

fn parse_updated(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

fn file_mtime(path: &Path) -> Result<DateTime<Utc>> {
    let metadata =
        std::fs::metadata(path).with_context(|| format!("Failed to stat {}", path.display()))?;
    let modified = metadata
        .modified()
        .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
    Ok(DateTime::<Utc>::from(modified))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
