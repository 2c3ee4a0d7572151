//! Link data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A link scraped from the listing page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
    /// Absolute URL of the linked page
    pub url: String,

    /// Visible anchor text, whitespace-normalised
    pub title: String,
}

impl Link {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// A row of the persisted store: one per URL ever observed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeenLink {
    pub url: String,

    /// Set once at insertion
    pub first_seen_utc: DateTime<Utc>,

    /// Unset for rows written before titles were tracked
    pub last_title: Option<String>,

    /// Time of the most recent title change or backfill
    pub last_changed_utc: Option<DateTime<Utc>>,
}
