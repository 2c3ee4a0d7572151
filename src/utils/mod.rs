//! Utility functions and helpers.

use url::Url;

/// Number of endpoint characters kept when an endpoint appears in logs.
const REDACT_KEEP: usize = 60;

/// Resolve a potentially relative URL against a base URL.
///
/// Returns `None` when the href cannot be joined (e.g. a malformed scheme).
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    base.join(href).ok()
}

/// Collapse whitespace runs to single spaces and trim both ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shorten a webhook endpoint for log output.
pub fn redact_endpoint(endpoint: &str) -> String {
    if endpoint.chars().count() <= REDACT_KEEP {
        return endpoint.to_string();
    }
    let head: String = endpoint.chars().take(REDACT_KEEP).collect();
    format!("{head}...")
}
