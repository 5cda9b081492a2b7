//! Data models for notes

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name of a note, as written in a link or passed as a root.
///
/// Equality and hashing go through [`NoteId::key`], so `[[my note]]` and
/// `[[My Note]]` name the same graph node. Display keeps the original case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self(name.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded form used for visited sets and index lookups
    pub fn key(&self) -> String {
        normalize_key(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalize a note name for case-insensitive comparison
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl PartialEq for NoteId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for NoteId {}

impl Hash for NoteId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NoteId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A note loaded from disk for the current traversal step
#[derive(Debug, Clone)]
pub struct NoteRecord {
    /// Resolved name, in the case used by the file on disk
    pub id: NoteId,
    /// Location of the note file
    pub path: PathBuf,
    /// Raw file contents, frontmatter included
    pub content: String,
}
