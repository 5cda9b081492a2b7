//! Note to card synthesis

use std::collections::BTreeSet;

use super::models::Card;
use crate::markdown::{outgoing_links, Transformed};
use crate::notes::{Metadata, NoteId, NoteRecord};

/// Tag handling shared by every card in a run
#[derive(Debug, Clone)]
pub struct TagRules {
    /// Applied when a note ends up with no tags at all
    pub default_tag: Option<String>,
    /// Notes carrying this tag never become cards
    pub exclusion_tag: String,
}

impl Default for TagRules {
    fn default() -> Self {
        Self {
            default_tag: Some("default".to_string()),
            exclusion_tag: "not_included".to_string(),
        }
    }
}

/// Normalize a tag: trim, drop a leading `#`, lower-case, and replace
/// whitespace with `_` since the store splits tags on spaces
pub fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim().trim_start_matches('#').trim();
    if tag.is_empty() {
        return None;
    }
    let normalized: String = tag
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    Some(normalized)
}

/// Union of declared and inline tags, normalized and de-duplicated
pub fn collect_tags(declared: &[String], inline: &[String]) -> BTreeSet<String> {
    declared
        .iter()
        .chain(inline.iter())
        .filter_map(|tag| normalize_tag(tag))
        .collect()
}

/// Whether a note opts out of card creation through its frontmatter or an
/// inline exclusion tag
pub fn is_excluded(metadata: &Metadata, transformed: &Transformed, rules: &TagRules) -> bool {
    if metadata.excludes(&rules.exclusion_tag) {
        return true;
    }
    match normalize_tag(&rules.exclusion_tag) {
        Some(exclusion) => transformed
            .inline_tags
            .iter()
            .filter_map(|tag| normalize_tag(tag))
            .any(|tag| tag == exclusion),
        None => false,
    }
}

/// Build the card for a note and list the notes it links to.
///
/// Links are read from the raw note text, so a link is kept even though the
/// rendered back shows it as plain text.
pub fn synthesize(
    record: &NoteRecord,
    metadata: &Metadata,
    transformed: Transformed,
    rules: &TagRules,
) -> (Card, Vec<NoteId>) {
    let mut tags = collect_tags(&metadata.tags, &transformed.inline_tags);
    if tags.is_empty() {
        if let Some(default_tag) = rules.default_tag.as_deref().and_then(normalize_tag) {
            tags.insert(default_tag);
        }
    }

    let card = Card {
        front: record.id.to_string(),
        back: transformed.html,
        tags,
    };

    (card, outgoing_links(&record.content))
}
