//! Recursive link-following import
//!
//! Starts at the root notes, follows `[[links]]` breadth-first and submits
//! one card per reachable note to the configured deck.

mod report;
mod walker;

pub use report::{ImportReport, ImportSummary, NoteOutcome, Outcome};
pub use walker::{GraphWalker, ImportOptions};

use thiserror::Error;

use crate::anki::{CardStore, StoreError, StoreGateway};
use crate::config::Config;
use crate::notes::{NoteId, NoteIndex, ResolveError};

/// Errors that stop a run before any note is processed
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Note folder not found: {0}")]
    FolderNotFound(std::path::PathBuf),

    #[error("Failed to index notes: {0}")]
    Index(#[source] ResolveError),

    #[error("No root notes given")]
    NoRoots,

    #[error("Cannot reach the flashcard store: {0}")]
    Connectivity(#[source] StoreError),

    #[error("Cannot create deck '{deck}': {source}")]
    Deck {
        deck: String,
        #[source]
        source: StoreError,
    },
}

impl From<ResolveError> for ImportError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::FolderNotFound(path) => ImportError::FolderNotFound(path),
            other => ImportError::Index(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

fn root_ids(config: &Config) -> Result<Vec<NoteId>> {
    let roots: Vec<NoteId> = config
        .roots
        .iter()
        .map(NoteId::new)
        .filter(|id| !id.is_empty())
        .collect();
    if roots.is_empty() {
        return Err(ImportError::NoRoots);
    }
    Ok(roots)
}

fn build_index(config: &Config) -> Result<NoteIndex> {
    let index = NoteIndex::build(&config.folder, &config.import.index_options())?;
    if index.is_empty() {
        log::warn!("No notes found in {}", index.folder().display());
    } else {
        log::info!("Indexed {} note(s) in {}", index.len(), index.folder().display());
    }
    Ok(index)
}

/// Import every note reachable from `config.roots` into `config.deck`.
///
/// The folder is indexed and the store probed before the first note is read;
/// failures there abort the run. Per-note problems are recorded in the report.
pub fn run_import(config: &Config, store: Box<dyn CardStore>) -> Result<ImportReport> {
    let roots = root_ids(config)?;
    let index = build_index(config)?;

    let gateway = StoreGateway::new(store, config.deck.clone())
        .with_check_before_add(config.anki.check_before_add)
        .with_submit_delay(config.anki.submit_delay());

    let version = gateway.probe().map_err(ImportError::Connectivity)?;
    log::info!("Connected to AnkiConnect (API version {})", version);

    gateway.ensure_deck().map_err(|source| ImportError::Deck {
        deck: config.deck.clone(),
        source,
    })?;

    let walker = GraphWalker::new(&index, Some(&gateway), ImportOptions::from(&config.import));
    Ok(walker.run(&roots))
}

/// Walk the same graph as [`run_import`] without contacting the store
pub fn preview_import(config: &Config) -> Result<ImportReport> {
    let roots = root_ids(config)?;
    let index = build_index(config)?;

    let walker = GraphWalker::new(&index, None, ImportOptions::from(&config.import));
    let mut report = walker.run(&roots);
    report.deck = config.deck.clone();
    Ok(report)
}
