//! Turn a folder of linked markdown notes into Anki flashcards.
//!
//! Starting from a set of root notes, [`import::run_import`] follows
//! `[[wiki-links]]` breadth-first, converts each reachable note to a card and
//! submits it to a deck through AnkiConnect. Re-running an import does not
//! create duplicate cards.

pub mod anki;
pub mod config;
pub mod flashcards;
pub mod import;
pub mod markdown;
pub mod notes;
