//! Storage abstractions for seen-link persistence.
//!
//! One relation keyed by URL:
//!
//! ```text
//! seen_links
//! ├── url               TEXT PRIMARY KEY
//! ├── first_seen_utc    TEXT NOT NULL    set once at insertion
//! ├── last_title        TEXT             NULL for rows from title-less versions
//! └── last_changed_utc  TEXT             bumped on every title change or backfill
//! ```
//!
//! Rows are never deleted.

pub mod sqlite;

use std::collections::HashSet;

use crate::error::Result;
use crate::models::{Link, SeenLink};

// Re-export for convenience
pub use sqlite::SqliteStore;

/// Stored title of a URL, distinguishing a missing row from a row with no title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleLookup {
    /// No row for this URL
    Missing,
    /// Row exists but its title was never recorded
    Untitled,
    Title(String),
}

/// Trait for seen-link storage backends.
pub trait LinkStore: Send + Sync {
    /// Create the relation if absent and add columns missing from older layouts.
    ///
    /// Safe to call on every run.
    fn ensure_schema(&self) -> Result<()>;

    /// All URLs currently stored.
    fn known_urls(&self) -> Result<HashSet<String>>;

    /// Stored title for a URL.
    fn title(&self, url: &str) -> Result<TitleLookup>;

    /// Set the title of an existing row and refresh its change timestamp.
    fn record_title(&self, url: &str, title: &str) -> Result<()>;

    /// Insert all links with one shared first-seen timestamp, ignoring URLs
    /// that already exist. Returns the number of rows actually inserted.
    fn insert_new_links(&self, links: &[Link]) -> Result<usize>;

    /// Full row for a URL.
    fn get(&self, url: &str) -> Result<Option<SeenLink>>;

    /// Number of stored rows.
    fn count(&self) -> Result<usize>;

    /// Most recently first-seen rows, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<SeenLink>>;
}
