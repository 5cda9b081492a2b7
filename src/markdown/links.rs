//! Wiki-link parsing
//!
//! Handles the Obsidian link forms:
//! - `[[Note]]` - basic link
//! - `[[Note|alias]]` - display alias
//! - `[[Note#Heading]]` - heading reference
//! - `[[folder/Note]]` - path
//! - `![[Note]]` / `![[image.png]]` - embeds

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::transform::map_outside_code;
use crate::notes::NoteId;

static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[\[([^\[\]\n]+)\]\]").unwrap());

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "avif"];

/// A parsed `[[...]]` token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    /// Link target as written, path included, heading removed
    pub target: String,
    /// Heading or block reference after `#`
    pub heading: Option<String>,
    /// Alias after `|`
    pub alias: Option<String>,
    /// Written with a leading `!`
    pub embed: bool,
}

impl WikiLink {
    /// Parse the text between `[[` and `]]`
    pub fn parse(inner: &str, embed: bool) -> Self {
        let (reference, alias) = match inner.split_once('|') {
            // Links inside tables escape the pipe as `\|`
            Some((reference, alias)) => (reference.trim_end_matches('\\'), Some(alias.trim())),
            None => (inner, None),
        };

        let (target, heading) = match reference.split_once('#') {
            Some((target, heading)) => (target.trim(), Some(heading.trim())),
            None => (reference.trim(), None),
        };

        Self {
            target: target.to_string(),
            heading: heading.filter(|h| !h.is_empty()).map(str::to_string),
            alias: alias.filter(|a| !a.is_empty()).map(str::to_string),
            embed,
        }
    }

    /// Note name used for resolution: the last path segment of the target
    pub fn note_name(&self) -> &str {
        self.target.rsplit('/').next().unwrap_or_default().trim()
    }

    /// Whether this embeds an image rather than referencing a note
    pub fn is_image(&self) -> bool {
        self.embed && has_image_extension(&self.target)
    }

    /// Plain text shown in place of the link
    pub fn display_text(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match (&self.heading, self.target.is_empty()) {
            (Some(heading), true) => heading.clone(),
            (Some(heading), false) => format!("{} > {}", self.target, heading),
            (None, _) => self.target.clone(),
        }
    }

    /// Note this link points at, if it names one
    pub fn note_id(&self) -> Option<NoteId> {
        if self.is_image() {
            return None;
        }
        let id = NoteId::new(self.note_name());
        (!id.is_empty()).then_some(id)
    }
}

/// Whether a file name ends with a known image extension
pub fn has_image_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.trim().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// All wiki-links in `text` outside code, in order of appearance
pub fn find_wiki_links(text: &str) -> Vec<WikiLink> {
    let mut links = Vec::new();
    map_outside_code(text, |segment| {
        for caps in WIKILINK_RE.captures_iter(segment) {
            links.push(link_from_captures(&caps));
        }
        String::new()
    });
    links
}

/// Notes referenced by `text`, de-duplicated case-insensitively in
/// first-occurrence order. Image embeds and same-note heading links are
/// not note references.
pub fn outgoing_links(text: &str) -> Vec<NoteId> {
    let mut seen = HashSet::new();
    find_wiki_links(text)
        .iter()
        .filter_map(WikiLink::note_id)
        .filter(|id| seen.insert(id.key()))
        .collect()
}

/// Replace every wiki-link in `segment` using `replace`
pub(crate) fn replace_wiki_links(segment: &str, mut replace: impl FnMut(&WikiLink) -> String) -> String {
    WIKILINK_RE
        .replace_all(segment, |caps: &Captures| replace(&link_from_captures(caps)))
        .to_string()
}

fn link_from_captures(caps: &Captures) -> WikiLink {
    let embed = caps.get(1).map(|m| !m.as_str().is_empty()).unwrap_or(false);
    let inner = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    WikiLink::parse(inner, embed)
}
