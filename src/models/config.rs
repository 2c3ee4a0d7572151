//! Application configuration structures.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Listing page and HTTP behavior settings
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Embedded store location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Destinations source and message templates
    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.watcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("watcher.user_agent is empty"));
        }
        if self.watcher.timeout_secs == 0 {
            return Err(AppError::validation("watcher.timeout_secs must be > 0"));
        }
        if self.notify.timeout_secs == 0 {
            return Err(AppError::validation("notify.timeout_secs must be > 0"));
        }
        Url::parse(&self.watcher.listing_url).map_err(|e| {
            AppError::validation(format!(
                "watcher.listing_url '{}' is not a valid URL: {e}",
                self.watcher.listing_url
            ))
        })?;
        Regex::new(&self.watcher.link_pattern).map_err(|e| {
            AppError::validation(format!("watcher.link_pattern does not compile: {e}"))
        })?;
        if self.storage.db_path.trim().is_empty() {
            return Err(AppError::validation("storage.db_path is empty"));
        }
        for (name, template) in [
            ("notify.new_template", &self.notify.new_template),
            ("notify.updated_template", &self.notify.updated_template),
        ] {
            if !template.contains("{title}") {
                return Err(AppError::validation(format!(
                    "{name} must contain {{title}}"
                )));
            }
        }
        Ok(())
    }
}

/// Listing page and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// The single page enumerating update announcements
    #[serde(default = "defaults::listing_url")]
    pub listing_url: String,

    /// User-Agent header for the listing request
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Regex matched against each anchor's trimmed href
    #[serde(default = "defaults::link_pattern")]
    pub link_pattern: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            listing_url: defaults::listing_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            link_pattern: defaults::link_pattern(),
        }
    }
}

/// Embedded store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::db_path(),
        }
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// JSON file holding `DISCORD_WEBHOOK_URLS`
    #[serde(default = "defaults::destinations_file")]
    pub destinations_file: String,

    /// Webhook request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Message for a link seen for the first time.
    ///
    /// Placeholders: `{title}`, `{url}`
    #[serde(default = "defaults::new_template")]
    pub new_template: String,

    /// Message for a known link whose title changed.
    #[serde(default = "defaults::updated_template")]
    pub updated_template: String,
}

impl NotifyConfig {
    /// Render the "new" message for a link.
    pub fn new_message(&self, title: &str, url: &str) -> String {
        render(&self.new_template, title, url)
    }

    /// Render the "updated" message for a link.
    pub fn updated_message(&self, title: &str, url: &str) -> String {
        render(&self.updated_template, title, url)
    }
}

fn render(template: &str, title: &str, url: &str) -> String {
    template.replace("{title}", title).replace("{url}", url)
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            destinations_file: defaults::destinations_file(),
            timeout_secs: defaults::timeout(),
            new_template: defaults::new_template(),
            updated_template: defaults::updated_template(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when neither `--verbose` nor `RUST_LOG` is given
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Watcher defaults
    pub fn listing_url() -> String {
        "https://www.maplesea.com/updates".into()
    }
    pub fn user_agent() -> String {
        "MapleSEA-Updates-Watcher/1.2".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn link_pattern() -> String {
        r"(?i)/updates(/|$)".into()
    }

    // Storage defaults
    pub fn db_path() -> String {
        "seen_links.db".into()
    }

    // Notify defaults
    pub fn destinations_file() -> String {
        "config.json".into()
    }
    pub fn new_template() -> String {
        "🆕 NEW: **{title}**".into()
    }
    pub fn updated_template() -> String {
        "🔄 UPDATED (title changed): **{title}**".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
