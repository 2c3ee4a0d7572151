// src/config.rs

//! Destination resolution.
//!
//! Webhook destinations come from the first source that yields any:
//! 1. the JSON destinations file (`DISCORD_WEBHOOK_URLS`, usually written by CI from secrets)
//! 2. `DISCORD_WEBHOOK_URL` (single endpoint)
//! 3. `DISCORD_WEBHOOK_URLS_CSV` (comma-separated endpoints)
//!
//! A missing or unreadable file is never fatal; the watcher then falls back to
//! the environment, and finally to printing messages locally.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Destination, DestinationEntry};

/// Environment variable holding a single webhook endpoint.
pub const ENV_SINGLE: &str = "DISCORD_WEBHOOK_URL";

/// Environment variable holding comma-separated webhook endpoints.
pub const ENV_CSV: &str = "DISCORD_WEBHOOK_URLS_CSV";

/// Shape of the destinations file.
#[derive(Debug, Default, Deserialize)]
pub struct DestinationsFile {
    #[serde(rename = "DISCORD_WEBHOOK_URLS", default)]
    pub webhooks: Option<Vec<DestinationEntry>>,
}

impl DestinationsFile {
    /// Read and parse the destinations file. `Ok(None)` when it does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Could not read {}: {e}", path.display())))?;
        let parsed = serde_json::from_str(&content)
            .map_err(|e| AppError::config(format!("Could not parse {}: {e}", path.display())))?;
        Ok(Some(parsed))
    }
}

/// Resolve destinations from the file at `path` and the process environment.
pub fn load_destinations(path: &Path) -> Vec<Destination> {
    let file = DestinationsFile::load(path).unwrap_or_else(|e| {
        log::warn!("{e}");
        None
    });
    let single = std::env::var(ENV_SINGLE).ok();
    let csv = std::env::var(ENV_CSV).ok();

    resolve_destinations(file, single.as_deref(), csv.as_deref())
}

/// Apply source precedence to already-read inputs.
pub fn resolve_destinations(
    file: Option<DestinationsFile>,
    single: Option<&str>,
    csv: Option<&str>,
) -> Vec<Destination> {
    let from_file: Vec<Destination> = file
        .and_then(|f| f.webhooks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(DestinationEntry::into_destination)
        .collect();
    if !from_file.is_empty() {
        log::debug!("Using {} destination(s) from file", from_file.len());
        return from_file;
    }

    if let Some(endpoint) = single.map(str::trim).filter(|s| !s.is_empty()) {
        log::debug!("Using {ENV_SINGLE}");
        return vec![Destination::new(endpoint, "")];
    }

    if let Some(csv) = csv {
        let endpoints: Vec<Destination> = csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Destination::new(s, ""))
            .collect();
        if !endpoints.is_empty() {
            log::debug!("Using {} destination(s) from {ENV_CSV}", endpoints.len());
            return endpoints;
        }
    }

    Vec::new()
}
