//! Breadth-first traversal of the note link graph

use std::collections::{HashSet, VecDeque};

use crate::anki::{StoreGateway, SubmitOutcome};
use crate::config::ImportSettings;
use crate::flashcards::{is_excluded, synthesize, TagRules};
use crate::markdown::{outgoing_links, strip_title_heading, transform_with, TransformOptions};
use crate::notes::{parse_frontmatter, NoteId, NoteIndex, ResolveError};

use super::report::{ImportReport, NoteOutcome, Outcome};

/// Traversal and card options for one run
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Links on notes at this depth are not followed; roots are depth 0
    pub max_depth: Option<usize>,
    pub tag_rules: TagRules,
    pub transform: TransformOptions,
    pub strip_title_heading: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::from(&ImportSettings::default())
    }
}

impl From<&ImportSettings> for ImportOptions {
    fn from(settings: &ImportSettings) -> Self {
        Self {
            max_depth: settings.max_depth,
            tag_rules: settings.tag_rules(),
            transform: settings.transform_options(),
            strip_title_heading: settings.strip_title_heading,
        }
    }
}

struct Pending {
    id: NoteId,
    depth: usize,
    linked_from: Option<String>,
}

/// Walks the link graph from a set of roots, turning each reachable note
/// into at most one card.
///
/// Without a gateway the walk is a dry run: every card that would be
/// submitted is reported as [`Outcome::Previewed`].
pub struct GraphWalker<'a> {
    index: &'a NoteIndex,
    gateway: Option<&'a StoreGateway>,
    options: ImportOptions,
}

impl<'a> GraphWalker<'a> {
    pub fn new(index: &'a NoteIndex, gateway: Option<&'a StoreGateway>, options: ImportOptions) -> Self {
        Self {
            index,
            gateway,
            options,
        }
    }

    pub fn run(&self, roots: &[NoteId]) -> ImportReport {
        let deck = self.gateway.map(|g| g.deck().to_string()).unwrap_or_default();
        let mut report = ImportReport::new(deck, self.gateway.is_none());

        // A note is marked visited when it is enqueued, never later. Keys are
        // the resolved file, so different spellings of one link collapse.
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<Pending> = VecDeque::new();

        for root in roots.iter().filter(|r| !r.is_empty()) {
            if visited.insert(self.index.identity(root)) {
                queue.push_back(Pending {
                    id: root.clone(),
                    depth: 0,
                    linked_from: None,
                });
            } else {
                log::debug!("Ignoring repeated root '{}'", root);
            }
        }

        while let Some(pending) = queue.pop_front() {
            let (outcome, links) = self.visit(&pending);

            let follow = self
                .options
                .max_depth
                .map_or(true, |max| pending.depth < max);
            if follow {
                let source = outcome.title.clone().unwrap_or_else(|| pending.id.to_string());
                for link in links {
                    if visited.insert(self.index.identity(&link)) {
                        queue.push_back(Pending {
                            id: link,
                            depth: pending.depth + 1,
                            linked_from: Some(source.clone()),
                        });
                    }
                }
            } else if !links.is_empty() {
                log::debug!(
                    "Not following {} link(s) from '{}': depth limit reached",
                    links.len(),
                    pending.id
                );
            }

            report.record(outcome);
        }

        report.finish();
        let summary = report.summary();
        log::info!(
            "Import finished: {} created, {} duplicate, {} skipped, {} previewed, {} not found, {} failed",
            summary.created,
            summary.duplicate,
            summary.skipped,
            summary.previewed,
            summary.not_found,
            summary.failed
        );
        report
    }

    /// Process one note, returning its outcome and the notes it links to
    fn visit(&self, pending: &Pending) -> (NoteOutcome, Vec<NoteId>) {
        let mut outcome = NoteOutcome {
            note: pending.id.to_string(),
            title: None,
            path: None,
            depth: pending.depth,
            linked_from: pending.linked_from.clone(),
            outcome: Outcome::NotFound,
            warnings: Vec::new(),
        };

        let record = match self.index.resolve(&pending.id) {
            Ok(record) => record,
            Err(ResolveError::NotFound(_)) => {
                match &pending.linked_from {
                    Some(from) => log::warn!("Note not found: '{}' (linked from '{}')", pending.id, from),
                    None => log::warn!("Note not found: '{}'", pending.id),
                }
                return (outcome, Vec::new());
            }
            Err(e) => {
                log::warn!("Skipping '{}': {}", pending.id, e);
                outcome.outcome = Outcome::Failed {
                    reason: e.to_string(),
                };
                return (outcome, Vec::new());
            }
        };

        outcome.title = Some(record.id.to_string());
        outcome.path = Some(record.path.clone());

        let (metadata, body) = parse_frontmatter(&record.content);
        if let Some(warning) = &metadata.warning {
            log::warn!("{}: {}", record.path.display(), warning);
            outcome.warnings.push(warning.to_string());
        }

        let body = if self.options.strip_title_heading {
            strip_title_heading(&body, record.id.as_str())
        } else {
            body
        };
        let transformed = transform_with(&body, &self.options.transform);

        if is_excluded(&metadata, &transformed, &self.options.tag_rules) {
            log::info!("Skipped '{}': marked {}", record.id, self.options.tag_rules.exclusion_tag);
            outcome.outcome = Outcome::Skipped {
                reason: format!("marked {}", self.options.tag_rules.exclusion_tag),
            };
            return (outcome, outgoing_links(&record.content));
        }

        let (card, links) = synthesize(&record, &metadata, transformed, &self.options.tag_rules);

        outcome.outcome = match self.gateway {
            None => {
                log::info!("Would add '{}' [{}]", card.front, card.tag_list().join(" "));
                Outcome::Previewed
            }
            Some(gateway) => match gateway.submit(&card) {
                Ok(SubmitOutcome::Created(card_id)) => {
                    log::info!("Added '{}' ({})", card.front, card_id);
                    Outcome::Created { card_id }
                }
                Ok(SubmitOutcome::Duplicate) => {
                    log::info!("'{}' already in deck", card.front);
                    Outcome::Duplicate
                }
                Err(e) => {
                    log::warn!("{}", e);
                    Outcome::Failed {
                        reason: e.source.to_string(),
                    }
                }
            },
        };

        (outcome, links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anki::MemoryStore;
    use crate::notes::IndexOptions;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_note(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(format!("{}.md", name)), content).unwrap();
    }

    fn roots(names: &[&str]) -> Vec<NoteId> {
        names.iter().map(|n| NoteId::from(*n)).collect()
    }

    fn index(dir: &TempDir) -> NoteIndex {
        NoteIndex::build(dir.path(), &IndexOptions::default()).unwrap()
    }

    fn run(index: &NoteIndex, store: &MemoryStore, names: &[&str]) -> ImportReport {
        let gateway = StoreGateway::new(Box::new(store.clone()), "Deck");
        GraphWalker::new(index, Some(&gateway), ImportOptions::default()).run(&roots(names))
    }

    #[test]
    fn test_root_and_child_become_cards() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "See [[Child Note]] and tag #topic.");
        write_note(dir.path(), "child note", "Leaf content.");

        let store = MemoryStore::new();
        let report = run(&index(&dir), &store, &["Root"]);

        let notes = store.notes();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].card.front, "Root");
        assert_eq!(notes[0].card.back, "See Child Note and tag #topic.");
        assert_eq!(notes[0].card.tag_list(), vec!["topic"]);
        assert_eq!(notes[1].card.front, "child note");
        assert_eq!(notes[1].card.back, "Leaf content.");
        assert_eq!(notes[1].card.tag_list(), vec!["default"]);

        let child = report.find("Child Note").unwrap();
        assert_eq!(child.depth, 1);
        assert_eq!(child.linked_from.as_deref(), Some("Root"));
        assert_eq!(report.summary().created, 2);
    }

    #[test]
    fn test_cycle_visits_each_note_once() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "A", "Go to [[B]]");
        write_note(dir.path(), "B", "Back to [[a]]");

        let store = MemoryStore::new();
        let report = run(&index(&dir), &store, &["A"]);

        assert_eq!(report.order(), vec!["A", "B"]);
        assert_eq!(store.fronts(), vec!["A", "B"]);
        assert_eq!(store.add_calls(), 2);
    }

    #[test]
    fn test_breadth_first_order() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "[[A]] [[B]]");
        write_note(dir.path(), "A", "[[A1]]");
        write_note(dir.path(), "B", "[[B1]]");
        write_note(dir.path(), "A1", "leaf");
        write_note(dir.path(), "B1", "leaf");

        let store = MemoryStore::new();
        let report = run(&index(&dir), &store, &["Root"]);

        assert_eq!(report.order(), vec!["Root", "A", "B", "A1", "B1"]);
        assert_eq!(report.find("B1").unwrap().depth, 2);
    }

    #[test]
    fn test_case_variants_resolve_to_one_note() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "[[Topic]] [[TOPIC]] [[topic|alias]]");
        write_note(dir.path(), "topic", "content");

        let store = MemoryStore::new();
        let report = run(&index(&dir), &store, &["root"]);

        assert_eq!(store.fronts(), vec!["Root", "topic"]);
        assert_eq!(report.notes.len(), 2);
    }

    #[test]
    fn test_link_spellings_of_one_file_visit_it_once() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "[[Topic]] and [[Topic.md]] and [[dir/Topic]] and [[TOPIC#Part]]");
        write_note(dir.path(), "Topic", "[[root.md]]");

        let store = MemoryStore::new();
        let report = run(&index(&dir), &store, &["Root", "root.MD"]);

        assert_eq!(report.order(), vec!["Root", "Topic"]);
        assert_eq!(store.add_calls(), 2);
        assert_eq!(report.summary().total(), 2);
    }

    #[test]
    fn test_second_run_creates_nothing() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "[[Child]]");
        write_note(dir.path(), "Child", "leaf");
        let index = index(&dir);

        let store = MemoryStore::new();
        run(&index, &store, &["Root"]);
        let second = run(&index, &store, &["Root"]);

        assert_eq!(store.notes().len(), 2);
        let summary = second.summary();
        assert_eq!(summary.created, 0);
        assert_eq!(summary.duplicate, 2);
    }

    #[test]
    fn test_second_run_with_lookup_fallback() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "[[Child]]");
        write_note(dir.path(), "Child", "leaf");
        let index = index(&dir);

        let store = MemoryStore::new().without_native_dedup();
        for _ in 0..2 {
            let gateway = StoreGateway::new(Box::new(store.clone()), "Deck").with_check_before_add(true);
            GraphWalker::new(&index, Some(&gateway), ImportOptions::default()).run(&roots(&["Root"]));
        }

        assert_eq!(store.notes().len(), 2);
        assert_eq!(store.add_calls(), 2);
    }

    #[test]
    fn test_excluded_note_is_skipped_but_traversed() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "[[Hidden]] [[Inline]]");
        write_note(dir.path(), "Hidden", "---\nnot_included: true\n---\nSee [[Deep]]");
        write_note(dir.path(), "Inline", "Draft #not_included");
        write_note(dir.path(), "Deep", "deep");

        let store = MemoryStore::new();
        let report = run(&index(&dir), &store, &["Root"]);

        assert_eq!(store.fronts(), vec!["Root", "Deep"]);
        assert!(matches!(report.find("Hidden").unwrap().outcome, Outcome::Skipped { .. }));
        assert!(matches!(report.find("Inline").unwrap().outcome, Outcome::Skipped { .. }));
        assert_eq!(report.find("Deep").unwrap().linked_from.as_deref(), Some("Hidden"));
    }

    #[test]
    fn test_excluded_via_frontmatter_tags() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "---\ntags: [not_included, draft]\n---\nbody");

        let store = MemoryStore::new();
        let report = run(&index(&dir), &store, &["Root"]);

        assert!(store.notes().is_empty());
        assert_eq!(report.summary().skipped, 1);
    }

    #[test]
    fn test_missing_link_does_not_stop_run() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "[[Missing]] then [[Present]]");
        write_note(dir.path(), "Present", "here");

        let store = MemoryStore::new();
        let report = run(&index(&dir), &store, &["Root", "Absent Root"]);

        assert_eq!(store.fronts(), vec!["Root", "Present"]);
        let summary = report.summary();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.not_found, 2);
        assert_eq!(report.find("Missing").unwrap().outcome, Outcome::NotFound);
    }

    #[test]
    fn test_submit_failure_does_not_stop_run() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "[[Bad]] [[Good]]");
        write_note(dir.path(), "Bad", "[[Behind Bad]]");
        write_note(dir.path(), "Good", "fine");
        write_note(dir.path(), "Behind Bad", "reached");

        let store = MemoryStore::new().fail_on("Bad");
        let report = run(&index(&dir), &store, &["Root"]);

        assert!(matches!(report.find("Bad").unwrap().outcome, Outcome::Failed { .. }));
        assert_eq!(store.fronts(), vec!["Root", "Good", "Behind Bad"]);
        assert_eq!(report.summary().failed, 1);
    }

    #[test]
    fn test_max_depth_limits_traversal() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "[[One]]");
        write_note(dir.path(), "One", "[[Two]]");
        write_note(dir.path(), "Two", "leaf");

        let store = MemoryStore::new();
        let gateway = StoreGateway::new(Box::new(store.clone()), "Deck");
        let options = ImportOptions {
            max_depth: Some(1),
            ..ImportOptions::default()
        };
        let report = GraphWalker::new(&index(&dir), Some(&gateway), options).run(&roots(&["Root"]));

        assert_eq!(report.order(), vec!["Root", "One"]);
    }

    #[test]
    fn test_preview_submits_nothing() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "[[Child]]");
        write_note(dir.path(), "Child", "leaf");

        let report = GraphWalker::new(&index(&dir), None, ImportOptions::default()).run(&roots(&["Root"]));

        assert!(report.dry_run);
        assert_eq!(report.summary().previewed, 2);
    }

    #[test]
    fn test_duplicate_roots_collapse() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "[[Other]]");
        write_note(dir.path(), "Other", "[[root]]");

        let store = MemoryStore::new();
        let report = run(&index(&dir), &store, &["Root", "ROOT", "Other"]);

        assert_eq!(report.order(), vec!["Root", "Other"]);
        assert_eq!(report.find("Other").unwrap().depth, 0);
        assert_eq!(store.add_calls(), 2);
    }

    #[test]
    fn test_every_note_reported_exactly_once() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Hub", "[[A]] [[B]] [[C]] [[Nowhere]]");
        write_note(dir.path(), "A", "[[B]] [[Hub]]");
        write_note(dir.path(), "B", "[[C]] [[a]]");
        write_note(dir.path(), "C", "[[Hub]] #not_included");

        let store = MemoryStore::new();
        let report = run(&index(&dir), &store, &["Hub", "C"]);

        let mut seen: Vec<String> = report.notes.iter().map(|n| n.note.to_lowercase()).collect();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c", "hub", "nowhere"]);
        assert_eq!(report.summary().total(), 5);
        assert_eq!(store.add_calls(), 3);
    }

    #[test]
    fn test_title_heading_is_stripped() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Photosynthesis", "# Photosynthesis\n\nLight to sugar.");

        let store = MemoryStore::new();
        run(&index(&dir), &store, &["Photosynthesis"]);

        assert_eq!(store.notes()[0].card.back, "Light to sugar.");
    }

    #[test]
    fn test_invalid_frontmatter_is_a_warning() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Root", "---\ntags: [unclosed\n---\nbody");

        let store = MemoryStore::new();
        let report = run(&index(&dir), &store, &["Root"]);

        let root = report.find("Root").unwrap();
        assert!(matches!(root.outcome, Outcome::Created { .. }));
        assert_eq!(root.warnings.len(), 1);
    }
}
