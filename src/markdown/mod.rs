//! Markdown handling for card backs
//!
//! Converts note bodies to the HTML shown on the back of a card:
//! - Wiki-links become plain text, their targets are kept for traversal
//! - Images are replaced by a placeholder
//! - Inline `#tags` are collected and left in the text

mod links;
mod transform;

pub use links::*;
pub use transform::*;
