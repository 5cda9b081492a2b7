//! Deck-scoped card submission with duplicate handling

use std::thread;
use std::time::Duration;

use thiserror::Error;

use super::store::{CardStore, StoreError};
use crate::flashcards::{Card, CardId};

/// What happened to a submitted card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The store created a new note
    Created(CardId),
    /// A card with the same front is already in the deck
    Duplicate,
}

/// A card the store refused or could not be reached for
#[derive(Debug, Error)]
#[error("Failed to submit '{front}': {source}")]
pub struct SubmitError {
    pub front: String,
    #[source]
    pub source: StoreError,
}

/// Submits cards to one deck of a [`CardStore`].
///
/// Re-submitting an unchanged card yields [`SubmitOutcome::Duplicate`], so
/// an import can be re-run without creating copies.
pub struct StoreGateway {
    store: Box<dyn CardStore>,
    deck: String,
    check_before_add: bool,
    submit_delay: Duration,
}

impl StoreGateway {
    pub fn new(store: Box<dyn CardStore>, deck: impl Into<String>) -> Self {
        Self {
            store,
            deck: deck.into(),
            check_before_add: false,
            submit_delay: Duration::ZERO,
        }
    }

    /// Look the front up before adding, for stores without a duplicate check
    pub fn with_check_before_add(mut self, enabled: bool) -> Self {
        self.check_before_add = enabled;
        self
    }

    /// Pause after every add
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn deck(&self) -> &str {
        &self.deck
    }

    /// Connectivity probe, returning the store's API version
    pub fn probe(&self) -> Result<u32, StoreError> {
        self.store.version()
    }

    /// Make sure the target deck exists
    pub fn ensure_deck(&self) -> Result<(), StoreError> {
        self.store.create_deck(&self.deck)
    }

    /// Submit one card to the deck
    pub fn submit(&self, card: &Card) -> Result<SubmitOutcome, SubmitError> {
        let fail = |source: StoreError| SubmitError {
            front: card.front.clone(),
            source,
        };

        if self.check_before_add {
            let existing = self.store.find_notes(&self.deck, &card.front).map_err(fail)?;
            if !existing.is_empty() {
                log::debug!("'{}' already in deck '{}'", card.front, self.deck);
                return Ok(SubmitOutcome::Duplicate);
            }
        }

        let result = self.store.add_note(&self.deck, card);

        // Small delay to avoid overwhelming AnkiConnect
        if !self.submit_delay.is_zero() {
            thread::sleep(self.submit_delay);
        }

        match result {
            Ok(id) => Ok(SubmitOutcome::Created(id)),
            Err(e) if e.is_duplicate() => Ok(SubmitOutcome::Duplicate),
            Err(e) => Err(fail(e)),
        }
    }
}
