//! Paragraph-boundary text chunker.
//!
//! Splits a document body into [`ChunkPiece`]s that respect a type-dependent
//! size limit. The body is first normalized and divided into sections at
//! markdown headings, then each section is packed paragraph by paragraph.
//! Consecutive chunks within a section share a one-paragraph overlap so
//! sentence context survives the cut.

/// Size knobs for one document type.
#[derive(Debug, Clone)]
pub struct ChunkLimits {
    /// Soft upper bound on chunk text length, in characters.
    pub max_chars: usize,
    /// Chunks shorter than this try to merge into their predecessor.
    pub min_chars: usize,
    /// A trailing merge may grow a chunk to `max_chars * merge_tolerance`.
    pub merge_tolerance: f64,
}

/// One chunk of body text plus the heading it sits under.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkPiece {
    pub section: String,
    pub text: String,
}

/// Split a document body into ordered chunks.
///
/// Oversized paragraphs are emitted alone rather than split mid-paragraph,
/// so a chunk can exceed `max_chars` when a single paragraph does. Headings
/// themselves are carried in `section`, not in chunk text.
pub fn chunk_body(body: &str, limits: &ChunkLimits) -> Vec<ChunkPiece> {
    let normalized = normalize(body);
    let mut pieces = Vec::new();
    for section in split_sections(&normalized) {
        chunk_section(&section, limits, &mut pieces);
    }
    pieces
}

struct Section {
    heading: String,
    text: String,
}

/// Normalize line endings and collapse stacked blank lines to one.
fn normalize(body: &str) -> String {
    let unix = body.replace("\r\n", "\n");
    let mut out = String::with_capacity(unix.len());
    let mut newlines = 0usize;
    for ch in unix.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(ch);
            }
        } else {
            newlines = 0;
            out.push(ch);
        }
    }
    out
}

/// Divide the body at level 1-3 markdown headings. Content before the
/// first heading lands in a section with an empty heading.
fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        heading: String::new(),
        text: String::new(),
    };
    for line in text.lines() {
        match heading_text(line) {
            Some(heading) => {
                sections.push(current);
                current = Section {
                    heading,
                    text: String::new(),
                };
            }
            None => {
                current.text.push_str(line);
                current.text.push('\n');
            }
        }
    }
    sections.push(current);
    sections
}

fn heading_text(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if !(1..=3).contains(&hashes) {
        return None;
    }
    let rest = &trimmed[hashes..];
    if rest.starts_with(' ') || rest.starts_with('\t') {
        Some(rest.trim().to_string())
    } else {
        None
    }
}

fn chunk_section(section: &Section, limits: &ChunkLimits, out: &mut Vec<ChunkPiece>) {
    let paragraphs: Vec<&str> = section
        .text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        return;
    }

    let first_index = out.len();
    let mut buf: Vec<&str> = Vec::new();

    for para in paragraphs {
        // A paragraph beyond max_chars is flushed alone and unsplit; no
        // overlap is carried across it.
        if para.len() > limits.max_chars {
            if !buf.is_empty() {
                out.push(piece(&section.heading, &buf));
                buf.clear();
            }
            out.push(ChunkPiece {
                section: section.heading.clone(),
                text: para.to_string(),
            });
            continue;
        }

        if !buf.is_empty() && joined_len(&buf) + 2 + para.len() > limits.max_chars {
            out.push(piece(&section.heading, &buf));
            // Seed the next buffer with the flushed tail paragraph, unless
            // the pair would not fit under the limit.
            let tail = buf[buf.len() - 1];
            buf.clear();
            if tail.len() + 2 + para.len() <= limits.max_chars {
                buf.push(tail);
            }
        }
        buf.push(para);
    }

    if !buf.is_empty() {
        out.push(piece(&section.heading, &buf));
    }

    merge_trailing_fragment(out, first_index, limits);
}

fn joined_len(paras: &[&str]) -> usize {
    let chars: usize = paras.iter().map(|p| p.len()).sum();
    chars + 2 * paras.len().saturating_sub(1)
}

fn piece(heading: &str, paras: &[&str]) -> ChunkPiece {
    ChunkPiece {
        section: heading.to_string(),
        text: paras.join("\n\n"),
    }
}

/// Fold a trailing fragment shorter than `min_chars` into the chunk before
/// it, provided both chunks came from the same section and the merged text
/// stays within the tolerance.
fn merge_trailing_fragment(out: &mut Vec<ChunkPiece>, first_index: usize, limits: &ChunkLimits) {
    if out.len() < first_index + 2 {
        return;
    }
    if out[out.len() - 1].text.len() >= limits.min_chars {
        return;
    }

    // The fragment may open with the overlap paragraph already present at
    // the end of the previous chunk; strip it so the merge does not repeat it.
    let fragment = {
        let last = &out[out.len() - 1];
        let prev = &out[out.len() - 2];
        let head = last.text.split("\n\n").next().unwrap_or("");
        let tail = prev.text.rsplit("\n\n").next().unwrap_or("");
        if !head.is_empty() && head == tail {
            last.text[head.len()..].trim_start_matches("\n\n").to_string()
        } else {
            last.text.clone()
        }
    };
    if fragment.is_empty() {
        return;
    }

    let merged_limit = (limits.max_chars as f64 * limits.merge_tolerance) as usize;
    if out[out.len() - 2].text.len() + 2 + fragment.len() > merged_limit {
        return;
    }

    out.pop();
    if let Some(prev) = out.last_mut() {
        prev.text.push_str("\n\n");
        prev.text.push_str(&fragment);
    }
}
