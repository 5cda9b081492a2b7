//! In-memory [`CardStore`] for tests

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::store::{CardStore, StoreError};
use crate::flashcards::{Card, CardId};

#[derive(Debug, Clone)]
pub struct StoredNote {
    pub id: CardId,
    pub deck: String,
    pub card: Card,
}

#[derive(Default)]
struct State {
    notes: Vec<StoredNote>,
    decks: Vec<String>,
    next_id: i64,
    allow_duplicates: bool,
    offline: bool,
    failing_fronts: HashSet<String>,
    add_calls: usize,
}

/// Shared handle: clones see the same notes
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept duplicate fronts, like a store with no duplicate check
    pub fn without_native_dedup(self) -> Self {
        self.state.borrow_mut().allow_duplicates = true;
        self
    }

    /// Refuse every call
    pub fn offline(self) -> Self {
        self.state.borrow_mut().offline = true;
        self
    }

    /// Reject adds for this front
    pub fn fail_on(self, front: &str) -> Self {
        self.state.borrow_mut().failing_fronts.insert(front.to_string());
        self
    }

    pub fn notes(&self) -> Vec<StoredNote> {
        self.state.borrow().notes.clone()
    }

    pub fn fronts(&self) -> Vec<String> {
        self.state.borrow().notes.iter().map(|n| n.card.front.clone()).collect()
    }

    pub fn decks(&self) -> Vec<String> {
        self.state.borrow().decks.clone()
    }

    pub fn add_calls(&self) -> usize {
        self.state.borrow().add_calls
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.state.borrow().offline {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }
}

impl CardStore for MemoryStore {
    fn version(&self) -> Result<u32, StoreError> {
        self.check_online()?;
        Ok(6)
    }

    fn create_deck(&self, deck: &str) -> Result<(), StoreError> {
        self.check_online()?;
        let mut state = self.state.borrow_mut();
        if !state.decks.iter().any(|d| d == deck) {
            state.decks.push(deck.to_string());
        }
        Ok(())
    }

    fn add_note(&self, deck: &str, card: &Card) -> Result<CardId, StoreError> {
        self.check_online()?;
        let mut state = self.state.borrow_mut();
        state.add_calls += 1;

        if state.failing_fronts.contains(&card.front) {
            return Err(StoreError::Api(format!("cannot add '{}'", card.front)));
        }

        let exists = state
            .notes
            .iter()
            .any(|n| n.deck == deck && n.card.front == card.front);
        if exists && !state.allow_duplicates {
            return Err(StoreError::Duplicate(
                "cannot create note because it is a duplicate".to_string(),
            ));
        }

        state.next_id += 1;
        let id = CardId(state.next_id);
        state.notes.push(StoredNote {
            id,
            deck: deck.to_string(),
            card: card.clone(),
        });
        Ok(id)
    }

    fn find_notes(&self, deck: &str, front: &str) -> Result<Vec<CardId>, StoreError> {
        self.check_online()?;
        Ok(self
            .state
            .borrow()
            .notes
            .iter()
            .filter(|n| n.deck == deck && n.card.front == front)
            .map(|n| n.id)
            .collect())
    }
}
