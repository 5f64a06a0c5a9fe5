//! Frontmatter block parser.
//!
//! Source documents open with an optional `---` delimited metadata block of
//! `key: value` lines. Values are typed by a small explicit grammar
//! ([`Value`]): booleans, numbers, quoted or bare strings, and flat lists.
//! A file without a leading marker is all body. A malformed list value makes
//! that field absent rather than failing the parse; required-field
//! validation happens downstream where the document's slug is known.

/// A typed frontmatter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    /// Render a scalar as a string. Lists return `None`.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::List(_) => None,
        }
    }
}

/// Parsed frontmatter block: `key -> Value` pairs in file order.
#[derive(Debug, Clone, Default)]
pub struct Frontmatter {
    fields: Vec<(String, Value)>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Fetch a scalar field rendered as a string.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.to_scalar_string())
    }

    /// Fetch a list field with every element rendered as a string.
    pub fn get_string_list(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            Value::List(items) => items.iter().map(|v| v.to_scalar_string()).collect(),
            _ => None,
        }
    }
}

/// Split `text` into its frontmatter block and body.
///
/// Returns the parsed block and the body text that follows it. A missing
/// leading `---` marker, or an unclosed block, yields an empty block and
/// the whole input as body.
pub fn parse(text: &str) -> (Frontmatter, String) {
    let mut lines = text.lines();
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return (Frontmatter::default(), text.to_string()),
    }

    let rest: Vec<&str> = lines.collect();
    let end = match rest.iter().position(|line| line.trim_end() == "---") {
        Some(pos) => pos,
        None => return (Frontmatter::default(), text.to_string()),
    };

    let mut fields = Vec::new();
    for line in &rest[..end] {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, raw) = match line.split_once(':') {
            Some(pair) => pair,
            None => continue,
        };
        let key = key.trim();
        let raw = raw.trim();
        if key.is_empty() || raw.is_empty() {
            continue;
        }
        if let Some(value) = parse_value(raw) {
            fields.push((key.to_string(), value));
        }
    }

    let body = rest[end + 1..].join("\n");
    (Frontmatter { fields }, body)
}

/// Type a raw value string. Returns `None` for malformed list syntax.
fn parse_value(raw: &str) -> Option<Value> {
    if raw.starts_with('[') {
        return parse_list(raw);
    }
    Some(parse_scalar(raw))
}

/// Type a scalar: bool, number, quoted string, or bare string.
fn parse_scalar(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if is_number(raw) {
        if let Ok(n) = raw.parse::<f64>() {
            return Value::Number(n);
        }
    }
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));
    Value::String(unquoted.unwrap_or(raw).to_string())
}

fn is_number(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    !digits.is_empty()
        && !digits.starts_with('.')
        && !digits.ends_with('.')
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|c| *c == '.').count() <= 1
}

/// Parse a `[a, b, c]` list. Single quotes are normalized to double quotes
/// before splitting, elements are typed with the scalar grammar.
fn parse_list(raw: &str) -> Option<Value> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;
    let normalized = inner.replace('\'', "\"");

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in normalized.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                segments.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if in_quotes {
        return None;
    }
    let tail = current.trim().to_string();
    if !tail.is_empty() {
        segments.push(tail);
    }

    let mut values = Vec::new();
    for segment in segments {
        if segment.is_empty() {
            return None;
        }
        values.push(parse_scalar(&segment));
    }
    Some(Value::List(values))
}
