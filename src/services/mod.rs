//! Service layer for the watcher.
//!
//! This module contains the I/O-facing logic for:
//! - Listing page fetching (`PageFetcher`)
//! - Webhook fan-out (`Notifier`, `WebhookClient`)

mod fetcher;
mod notifier;

pub use fetcher::{LinkSource, PageFetcher, parse_links};
pub use notifier::{Deliver, DeliveryReport, Notifier, WebhookClient};
