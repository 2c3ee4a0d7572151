// src/services/fetcher.rs

//! Listing page fetcher.
//!
//! Downloads the listing page once and extracts the update links from it.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Link, WatcherConfig};
use crate::utils::{normalize_whitespace, resolve_url};

/// A source of the current listing links.
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Fetch links in document order, one per URL.
    async fn fetch_links(&self) -> Result<Vec<Link>>;
}

/// Fetches and parses the fixed listing page.
pub struct PageFetcher {
    client: Client,
    listing_url: Url,
    link_pattern: Regex,
}

impl PageFetcher {
    /// Create a fetcher from the watcher configuration.
    pub fn new(config: &WatcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            listing_url: Url::parse(&config.listing_url)?,
            link_pattern: Regex::new(&config.link_pattern)?,
        })
    }

    pub fn listing_url(&self) -> &Url {
        &self.listing_url
    }

    async fn download(&self) -> Result<String> {
        let url = self.listing_url.as_str();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::fetch(url, e))?;
        response.text().await.map_err(|e| AppError::fetch(url, e))
    }
}

#[async_trait]
impl LinkSource for PageFetcher {
    async fn fetch_links(&self) -> Result<Vec<Link>> {
        let html = self.download().await?;
        let links = parse_links(&html, &self.listing_url, &self.link_pattern);
        log::debug!(
            "Parsed {} update links from {}",
            links.len(),
            self.listing_url
        );
        Ok(links)
    }
}

/// Extract update links from a listing document.
///
/// Anchors whose trimmed `href` does not match `pattern` are dropped; the rest
/// are resolved against `base`. Later anchors to an already-seen URL are
/// discarded so the first anchor's text wins.
pub fn parse_links(html: &str, base: &Url, pattern: &Regex) -> Vec<Link> {
    let document = Html::parse_document(html);
    let Ok(anchor_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if !pattern.is_match(href) {
            continue;
        }
        let Some(resolved) = resolve_url(base, href) else {
            log::debug!("Skipping unresolvable href {href:?}");
            continue;
        };

        let url = resolved.to_string();
        if !seen.insert(url.clone()) {
            continue;
        }

        let raw_text: String = anchor.text().collect();
        links.push(Link {
            url,
            title: normalize_whitespace(&raw_text),
        });
    }

    links
}
