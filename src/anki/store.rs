use thiserror::Error;

use crate::flashcards::{Card, CardId};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Duplicate note: {0}")]
    Duplicate(String),

    #[error("AnkiConnect error: {0}")]
    Api(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }
}

/// Operations the importer needs from a flashcard store
pub trait CardStore {
    /// Connectivity probe, returning the API version
    fn version(&self) -> Result<u32, StoreError>;

    /// Create `deck` if it does not exist yet
    fn create_deck(&self, deck: &str) -> Result<(), StoreError>;

    /// Add one card to `deck`. A card whose front already exists in the deck
    /// fails with [`StoreError::Duplicate`].
    fn add_note(&self, deck: &str, card: &Card) -> Result<CardId, StoreError>;

    /// Cards in `deck` whose front equals `front`
    fn find_notes(&self, deck: &str, front: &str) -> Result<Vec<CardId>, StoreError>;
}
