//! Per-note results of an import run

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flashcards::CardId;

/// What happened to one note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// A new card was added
    Created { card_id: CardId },
    /// The deck already had a card for this note
    Duplicate,
    /// The note opted out of card creation
    Skipped { reason: String },
    /// Dry run: the card would have been submitted
    Previewed,
    /// No file matches the link
    NotFound,
    /// Reading the note or submitting its card failed
    Failed { reason: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Created { .. } => "created",
            Outcome::Duplicate => "duplicate",
            Outcome::Skipped { .. } => "skipped",
            Outcome::Previewed => "previewed",
            Outcome::NotFound => "not_found",
            Outcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOutcome {
    /// The identifier as it was linked or given as a root
    pub note: String,
    /// Card front, when the note was resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Hops from the nearest root
    pub depth: usize,
    /// The note whose link first reached this one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_from: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Counts per outcome category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub created: usize,
    pub duplicate: usize,
    pub skipped: usize,
    pub previewed: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.created + self.duplicate + self.skipped + self.previewed + self.not_found + self.failed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub deck: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub notes: Vec<NoteOutcome>,
}

impl ImportReport {
    pub fn new(deck: impl Into<String>, dry_run: bool) -> Self {
        Self {
            deck: deck.into(),
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            notes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: NoteOutcome) {
        self.notes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn summary(&self) -> ImportSummary {
        let mut summary = ImportSummary::default();
        for note in &self.notes {
            match note.outcome {
                Outcome::Created { .. } => summary.created += 1,
                Outcome::Duplicate => summary.duplicate += 1,
                Outcome::Skipped { .. } => summary.skipped += 1,
                Outcome::Previewed => summary.previewed += 1,
                Outcome::NotFound => summary.not_found += 1,
                Outcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    /// Outcome for a note, matched case-insensitively on the linked name or title
    pub fn find(&self, note: &str) -> Option<&NoteOutcome> {
        let key = crate::notes::normalize_key(note);
        self.notes.iter().find(|n| {
            crate::notes::normalize_key(&n.note) == key
                || n.title.as_deref().map(crate::notes::normalize_key) == Some(key.clone())
        })
    }

    /// Names of processed notes in processing order
    pub fn order(&self) -> Vec<&str> {
        self.notes.iter().map(|n| n.note.as_str()).collect()
    }

    pub fn has_failures(&self) -> bool {
        self.notes
            .iter()
            .any(|n| matches!(n.outcome, Outcome::Failed { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(note: &str, outcome: Outcome) -> NoteOutcome {
        NoteOutcome {
            note: note.to_string(),
            title: Some(note.to_string()),
            path: None,
            depth: 0,
            linked_from: None,
            outcome,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut report = ImportReport::new("Deck", false);
        report.record(outcome("a", Outcome::Created { card_id: CardId(1) }));
        report.record(outcome("b", Outcome::Duplicate));
        report.record(outcome("c", Outcome::NotFound));
        report.record(outcome("d", Outcome::Failed { reason: "x".to_string() }));

        let summary = report.summary();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.duplicate, 1);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 4);
        assert!(report.has_failures());
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let mut report = ImportReport::new("Deck", false);
        report.record(outcome("Child Note", Outcome::Duplicate));
        assert!(report.find("child note").is_some());
        assert!(report.find("other").is_none());
    }

    #[test]
    fn test_outcome_json_shape() {
        let note = outcome("Root", Outcome::Created { card_id: CardId(42) });
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["status"], "created");
        assert_eq!(json["card_id"], 42);
        assert_eq!(json["note"], "Root");
        assert!(json.get("warnings").is_none());

        let json = serde_json::to_value(outcome("x", Outcome::NotFound)).unwrap();
        assert_eq!(json["status"], "not_found");
    }
}
