//! Flashcards generated from notes
//!
//! This module provides:
//! - The card model handed to the flashcard store
//! - Tag normalization and the exclusion rule
//! - Card synthesis from a parsed, transformed note

pub mod models;
pub mod synthesize;

pub use models::*;
pub use synthesize::{collect_tags, is_excluded, normalize_tag, synthesize, TagRules};
