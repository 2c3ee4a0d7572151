//! Notification destinations.

use serde::{Deserialize, Serialize};

/// A webhook endpoint with the text prepended to every message sent to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Destination {
    pub endpoint: String,

    /// Prepended verbatim, e.g. `<@1234> ` or `@everyone `
    #[serde(default)]
    pub prefix: String,
}

impl Destination {
    pub fn new(endpoint: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            prefix: prefix.into(),
        }
    }

    /// Compose the outgoing text: `prefix + message`, then the URL on its own line.
    pub fn compose(&self, message: &str, url: &str) -> String {
        format!("{}{}\n{}", self.prefix, message, url)
    }
}

/// A destination as written in the destinations file.
///
/// Either a bare endpoint string or an object with an optional prefix.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DestinationEntry {
    Endpoint(String),
    Detailed {
        #[serde(default, alias = "endpoint")]
        url: Option<String>,
        #[serde(default)]
        prefix: String,
    },
}

impl DestinationEntry {
    /// Normalise into a [`Destination`]. Entries without an endpoint yield `None`.
    pub fn into_destination(self) -> Option<Destination> {
        match self {
            DestinationEntry::Endpoint(endpoint) => {
                let endpoint = endpoint.trim();
                (!endpoint.is_empty()).then(|| Destination::new(endpoint, ""))
            }
            DestinationEntry::Detailed { url, prefix } => url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .map(|u| Destination::new(u, prefix)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose() {
        let dest = Destination::new("https://hooks/1", "@everyone ");
        assert_eq!(
            dest.compose("NEW: **Patch 1.0**", "https://x/updates/1"),
            "@everyone NEW: **Patch 1.0**\nhttps://x/updates/1"
        );
    }

    #[test]
    fn test_entry_forms() {
        let entries: Vec<DestinationEntry> = serde_json::from_str(
            r#"[
                "https://hooks/bare",
                {"url": "https://hooks/a", "prefix": "<@1> "},
                {"endpoint": "https://hooks/b"},
                {"prefix": "orphan"}
            ]"#,
        )
        .unwrap();

        let dests: Vec<Destination> = entries
            .into_iter()
            .filter_map(DestinationEntry::into_destination)
            .collect();

        assert_eq!(
            dests,
            vec![
                Destination::new("https://hooks/bare", ""),
                Destination::new("https://hooks/a", "<@1> "),
                Destination::new("https://hooks/b", ""),
            ]
        );
    }
}
