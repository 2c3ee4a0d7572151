//! Diff calculation between the fetched links and the store.
//!
//! Splits the current fetch into links never seen before and links already
//! stored, and classifies what a known link's title means for notifications.

use std::collections::HashSet;

use crate::models::Link;
use crate::storage::TitleLookup;

/// Fetched links partitioned against the known-URL set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDiff {
    /// URL absent from the store, in fetch order
    pub new_links: Vec<Link>,
    /// URL already stored, in fetch order
    pub existing_links: Vec<Link>,
}

impl LinkDiff {
    /// Partition `links` by membership in `known`, preserving order.
    pub fn partition(links: Vec<Link>, known: &HashSet<String>) -> Self {
        let (existing_links, new_links): (Vec<Link>, Vec<Link>) = links
            .into_iter()
            .partition(|link| known.contains(&link.url));
        Self {
            new_links,
            existing_links,
        }
    }
}

/// What to do with a known link after comparing titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleChange {
    /// Stored row has no title yet: record it without notifying
    Backfill,
    /// Titles differ: notify and record
    Changed { previous: String },
    Unchanged,
    /// No row despite being in the known set
    Vanished,
}

/// Compare a stored title with the freshly fetched one.
pub fn classify_title(stored: TitleLookup, fetched: &str) -> TitleChange {
    match stored {
        TitleLookup::Missing => TitleChange::Vanished,
        TitleLookup::Untitled if fetched.is_empty() => TitleChange::Unchanged,
        TitleLookup::Untitled => TitleChange::Backfill,
        TitleLookup::Title(previous) if previous == fetched => TitleChange::Unchanged,
        TitleLookup::Title(previous) => TitleChange::Changed { previous },
    }
}
