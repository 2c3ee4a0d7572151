// src/pipeline/reconcile.rs

//! One reconciliation pass.
//!
//! Fetch → diff against the store → notify new links → persist them →
//! compare titles of known links → notify and record changes.
//!
//! A fetch failure ends the pass before anything is sent or stored. After a
//! successful fetch every link is handled on its own; a failed delivery is
//! only counted.

use crate::error::Result;
use crate::models::NotifyConfig;
use crate::pipeline::diff::{LinkDiff, TitleChange, classify_title};
use crate::services::{Deliver, DeliveryReport, LinkSource, Notifier};
use crate::storage::LinkStore;

/// Counts gathered during a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub new_links: usize,
    pub title_updates: usize,
    pub backfilled: usize,
    pub deliveries: usize,
    pub delivery_failures: usize,
}

impl RunSummary {
    fn record(&mut self, report: DeliveryReport) {
        self.deliveries += report.delivered;
        self.delivery_failures += report.failed;
    }

    pub fn has_changes(&self) -> bool {
        self.new_links > 0 || self.title_updates > 0
    }
}

/// Run one pass of the watcher.
///
/// New links are notified before they are persisted, so a crash in between
/// re-announces them on the next run rather than losing them.
pub async fn run_watcher<D: Deliver>(
    source: &dyn LinkSource,
    store: &dyn LinkStore,
    notifier: &Notifier<D>,
    messages: &NotifyConfig,
) -> Result<RunSummary> {
    store.ensure_schema()?;
    let known = store.known_urls()?;
    log::debug!("{} links already tracked", known.len());

    let links = source.fetch_links().await?;
    let mut summary = RunSummary {
        fetched: links.len(),
        ..RunSummary::default()
    };

    let diff = LinkDiff::partition(links, &known);

    for link in &diff.new_links {
        log::info!("New link: {} ({})", link.title, link.url);
        let message = messages.new_message(&link.title, &link.url);
        summary.record(notifier.notify(&message, &link.url).await);
    }
    if !diff.new_links.is_empty() {
        store.insert_new_links(&diff.new_links)?;
        summary.new_links = diff.new_links.len();
    }

    for link in &diff.existing_links {
        match classify_title(store.title(&link.url)?, &link.title) {
            TitleChange::Unchanged => {}
            TitleChange::Backfill => {
                log::debug!("Backfilling title for {}", link.url);
                store.record_title(&link.url, &link.title)?;
                summary.backfilled += 1;
            }
            TitleChange::Changed { previous } => {
                log::info!(
                    "Title changed for {}: {:?} -> {:?}",
                    link.url,
                    previous,
                    link.title
                );
                let message = messages.updated_message(&link.title, &link.url);
                summary.record(notifier.notify(&message, &link.url).await);
                store.record_title(&link.url, &link.title)?;
                summary.title_updates += 1;
            }
            TitleChange::Vanished => {
                log::warn!("{} disappeared from the store during the run", link.url);
            }
        }
    }

    log_summary(&summary);
    Ok(summary)
}

fn log_summary(summary: &RunSummary) {
    if summary.has_changes() {
        log::info!(
            "New links: {}, Title updates: {}.",
            summary.new_links,
            summary.title_updates
        );
    } else {
        log::info!("No new links. No title updates detected.");
    }
    log::debug!(
        "Fetched {}, backfilled {}, delivered {}, failed deliveries {}",
        summary.fetched,
        summary.backfilled,
        summary.deliveries,
        summary.delivery_failures
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::AppError;
    use crate::models::{Destination, Link};
    use crate::storage::{SqliteStore, TitleLookup};

    struct StaticSource(Vec<Link>);

    #[async_trait]
    impl LinkSource for StaticSource {
        async fn fetch_links(&self) -> Result<Vec<Link>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl LinkSource for FailingSource {
        async fn fetch_links(&self) -> Result<Vec<Link>> {
            Err(AppError::fetch("https://x/updates", "timed out"))
        }
    }

    #[derive(Default)]
    struct Recorder {
        failing: Vec<String>,
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Deliver for Recorder {
        async fn deliver(&self, endpoint: &str, content: &str) -> Result<()> {
            if self.failing.iter().any(|f| f == endpoint) {
                return Err(AppError::delivery(endpoint, "500"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((endpoint.to_string(), content.to_string()));
            Ok(())
        }
    }

    fn notifier() -> Notifier<Recorder> {
        Notifier::new(
            vec![Destination::new("https://hooks/a", "")],
            Recorder::default(),
        )
    }

    fn sent(notifier: &Notifier<Recorder>) -> Vec<String> {
        notifier
            .transport()
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, content)| content.clone())
            .collect()
    }

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn patch_links() -> Vec<Link> {
        vec![
            Link::new("https://x/updates/1", "Patch 1.0"),
            Link::new("https://x/updates/2", "Patch 0.9"),
        ]
    }

    #[tokio::test]
    async fn test_empty_store_all_new() {
        let store = store();
        let notifier = notifier();
        let messages = NotifyConfig::default();

        let summary = run_watcher(&StaticSource(patch_links()), &store, &notifier, &messages)
            .await
            .unwrap();

        assert_eq!(summary.new_links, 2);
        assert_eq!(summary.title_updates, 0);
        assert_eq!(
            sent(&notifier),
            vec![
                "🆕 NEW: **Patch 1.0**\nhttps://x/updates/1".to_string(),
                "🆕 NEW: **Patch 0.9**\nhttps://x/updates/2".to_string(),
            ]
        );

        let a = store.get("https://x/updates/1").unwrap().unwrap();
        let b = store.get("https://x/updates/2").unwrap().unwrap();
        assert_eq!(a.last_title.as_deref(), Some("Patch 1.0"));
        assert_eq!(b.last_title.as_deref(), Some("Patch 0.9"));
        assert_eq!(a.first_seen_utc, b.first_seen_utc);
    }

    #[tokio::test]
    async fn test_second_run_is_silent() {
        let store = store();
        let notifier = notifier();
        let messages = NotifyConfig::default();
        let source = StaticSource(patch_links());

        run_watcher(&source, &store, &notifier, &messages).await.unwrap();
        let first_count = sent(&notifier).len();

        let summary = run_watcher(&source, &store, &notifier, &messages)
            .await
            .unwrap();

        assert!(!summary.has_changes());
        assert_eq!(sent(&notifier).len(), first_count);
    }

    #[tokio::test]
    async fn test_title_change_notifies_once() {
        let store = store();
        store.ensure_schema().unwrap();
        store
            .insert_new_links(&[Link::new("https://x/updates/1", "Patch 1.0")])
            .unwrap();
        let first_seen = store
            .get("https://x/updates/1")
            .unwrap()
            .unwrap()
            .first_seen_utc;

        let notifier = notifier();
        let source = StaticSource(vec![Link::new("https://x/updates/1", "Patch 1.1")]);
        let summary = run_watcher(&source, &store, &notifier, &NotifyConfig::default())
            .await
            .unwrap();

        assert_eq!(summary.new_links, 0);
        assert_eq!(summary.title_updates, 1);
        assert_eq!(
            sent(&notifier),
            vec!["🔄 UPDATED (title changed): **Patch 1.1**\nhttps://x/updates/1".to_string()]
        );

        let row = store.get("https://x/updates/1").unwrap().unwrap();
        assert_eq!(row.last_title.as_deref(), Some("Patch 1.1"));
        assert!(row.last_changed_utc.is_some());
        assert_eq!(row.first_seen_utc, first_seen);
    }

    #[tokio::test]
    async fn test_title_revert_is_another_update() {
        let store = store();
        let notifier = notifier();
        let messages = NotifyConfig::default();

        for title in ["A", "B", "A"] {
            let source = StaticSource(vec![Link::new("https://x/updates/1", title)]);
            run_watcher(&source, &store, &notifier, &messages)
                .await
                .unwrap();
        }

        assert_eq!(sent(&notifier).len(), 3);
        assert_eq!(
            store.title("https://x/updates/1").unwrap(),
            TitleLookup::Title("A".into())
        );
    }

    #[tokio::test]
    async fn test_backfill_is_silent() {
        let store = store();
        store.ensure_schema().unwrap();
        store
            .insert_new_links(&[Link::new("https://x/updates/1", "")])
            .unwrap();

        let notifier = notifier();
        let source = StaticSource(vec![Link::new("https://x/updates/1", "B")]);
        let summary = run_watcher(&source, &store, &notifier, &NotifyConfig::default())
            .await
            .unwrap();

        assert_eq!(summary.backfilled, 1);
        assert_eq!(summary.title_updates, 0);
        assert!(sent(&notifier).is_empty());
        assert_eq!(
            store.title("https://x/updates/1").unwrap(),
            TitleLookup::Title("B".into())
        );
    }

    #[tokio::test]
    async fn test_empty_title_is_not_rewritten() {
        let store = store();
        let notifier = notifier();
        let messages = NotifyConfig::default();
        let source = StaticSource(vec![Link::new("https://x/updates/1", "")]);

        run_watcher(&source, &store, &notifier, &messages).await.unwrap();
        let summary = run_watcher(&source, &store, &notifier, &messages)
            .await
            .unwrap();

        assert_eq!(summary.backfilled, 0);
        assert_eq!(sent(&notifier).len(), 1);
        let row = store.get("https://x/updates/1").unwrap().unwrap();
        assert!(row.last_changed_utc.is_none());
    }

    #[tokio::test]
    async fn test_fetch_error_leaves_store_untouched() {
        let store = store();
        let notifier = notifier();

        let err = run_watcher(&FailingSource, &store, &notifier, &NotifyConfig::default())
            .await
            .unwrap_err();

        assert!(err.is_fetch());
        assert!(sent(&notifier).is_empty());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_delivery_still_persists() {
        let store = store();
        let notifier = Notifier::new(
            vec![
                Destination::new("https://hooks/down", ""),
                Destination::new("https://hooks/up", "@everyone "),
            ],
            Recorder {
                failing: vec!["https://hooks/down".into()],
                ..Recorder::default()
            },
        );

        let summary = run_watcher(
            &StaticSource(patch_links()),
            &store,
            &notifier,
            &NotifyConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(summary.delivery_failures, 2);
        assert_eq!(summary.deliveries, 2);
        assert!(sent(&notifier).iter().all(|c| c.starts_with("@everyone ")));
        assert_eq!(store.count().unwrap(), 2);
    }
}
