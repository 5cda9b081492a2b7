//! Anki access through the AnkiConnect add-on
//!
//! - `CardStore`: the operations the importer needs from a flashcard store
//! - `AnkiConnectClient`: JSON-over-HTTP implementation
//! - `StoreGateway`: deck-scoped submission that treats duplicates as done

mod client;
mod gateway;
#[cfg(test)]
mod memory;
mod store;

pub use client::{AnkiConnectClient, API_VERSION};
pub use gateway::{StoreGateway, SubmitError, SubmitOutcome};
#[cfg(test)]
pub use memory::MemoryStore;
pub use store::{CardStore, StoreError};
