//! YAML frontmatter parsing

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use super::models::normalize_key;

/// Recoverable problems with a note's header block.
///
/// The parser never fails: on a warning the note is treated as having no
/// metadata and its whole text becomes the body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    #[error("Frontmatter is not valid YAML: {0}")]
    InvalidYaml(String),

    #[error("Frontmatter is not a key/value mapping")]
    NotAMapping,
}

/// Header fields of a note
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// All header keys as parsed
    pub fields: Mapping,
    /// Tags declared under `tags` / `tag`
    pub tags: Vec<String>,
    /// Set by a truthy `not_included` key
    pub not_included: bool,
    /// Present when the header was malformed and ignored
    pub warning: Option<ParseWarning>,
}

impl Metadata {
    /// Whether this note opts out of card creation, either through the
    /// `not_included` key or by declaring `exclusion_tag`
    pub fn excludes(&self, exclusion_tag: &str) -> bool {
        let wanted = normalize_key(exclusion_tag.trim_start_matches('#'));
        self.not_included
            || self
                .tags
                .iter()
                .any(|tag| normalize_key(tag.trim_start_matches('#')) == wanted)
    }
}

/// Split a note into its frontmatter and body.
///
/// The header must open on the first line with `---` and close on a line
/// holding only `---` or `...`. Without a header the full text is the body.
pub fn parse_frontmatter(raw: &str) -> (Metadata, String) {
    let Some((header, body)) = split_header(raw) else {
        return (Metadata::default(), raw.to_string());
    };

    let body = body
        .trim_start_matches(|c| c == '\n' || c == '\r')
        .to_string();

    match serde_yaml::from_str::<Value>(header) {
        Ok(Value::Mapping(fields)) => {
            let tags = extract_frontmatter_tags(&fields);
            let not_included = fields.get("not_included").map(is_truthy).unwrap_or(false);
            let metadata = Metadata {
                fields,
                tags,
                not_included,
                warning: None,
            };
            (metadata, body)
        }
        // `---\n---` is an empty but valid header
        Ok(Value::Null) => (Metadata::default(), body),
        Ok(_) => degrade(raw, ParseWarning::NotAMapping),
        Err(e) => degrade(raw, ParseWarning::InvalidYaml(e.to_string())),
    }
}

fn degrade(raw: &str, warning: ParseWarning) -> (Metadata, String) {
    log::warn!("Ignoring frontmatter: {}", warning);
    let metadata = Metadata {
        warning: Some(warning),
        ..Metadata::default()
    };
    (metadata, raw.to_string())
}

/// Locate the header block, returning `(header, rest)`
fn split_header(raw: &str) -> Option<(&str, &str)> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = text.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Some((&text[header_start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }

    None
}

/// Extract tags from frontmatter
fn extract_frontmatter_tags(fields: &Mapping) -> Vec<String> {
    let mut tags = Vec::new();

    for key in ["tags", "tag"] {
        match fields.get(key) {
            Some(Value::Sequence(seq)) => {
                for item in seq {
                    if let Some(tag) = scalar_to_string(item) {
                        tags.push(tag);
                    }
                }
            }
            Some(Value::String(s)) => {
                // Tags might be comma or space separated
                for tag in s.split(|c: char| c == ',' || c.is_whitespace()) {
                    let tag = tag.trim();
                    if !tag.is_empty() {
                        tags.push(tag.to_string());
                    }
                }
            }
            Some(other) => {
                if let Some(tag) = scalar_to_string(other) {
                    tags.push(tag);
                }
            }
            None => {}
        }
    }

    tags
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        // A bare `not_included:` key is a marker
        Value::Null => true,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "" | "false" | "no" | "off" | "0"
        ),
        _ => true,
    }
}
