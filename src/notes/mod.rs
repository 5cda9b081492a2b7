//! Note folder access
//!
//! Handles locating and reading notes for an import run.
//! Supports:
//! - Case-insensitive lookup of `[[links]]` against file names
//! - YAML frontmatter with declared tags and the exclusion marker
//! - One directory snapshot per run

mod frontmatter;
mod models;
mod resolver;

pub use frontmatter::*;
pub use models::*;
pub use resolver::*;
