// src/models/mod.rs

//! Domain models for the watcher.
//!
//! Plain data structures shared by the fetcher, notifier, store and pipeline.

mod config;
mod destination;
mod link;

// Re-export all public types
pub use config::{Config, LoggingConfig, NotifyConfig, StorageConfig, WatcherConfig};
pub use destination::{Destination, DestinationEntry};
pub use link::{Link, SeenLink};
