// src/services/notifier.rs

//! Webhook notifier.
//!
//! Fans one message out to every configured destination. A failing
//! destination is logged and skipped; it never stops the others.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Destination, NotifyConfig};

/// Transport for a single delivery.
#[async_trait]
pub trait Deliver: Send + Sync {
    /// Send `content` to `endpoint`.
    async fn deliver(&self, endpoint: &str, content: &str) -> Result<()>;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts `{"content": ...}` JSON bodies to webhook endpoints.
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Deliver for WebhookClient {
    async fn deliver(&self, endpoint: &str, content: &str) -> Result<()> {
        self.client
            .post(endpoint)
            .json(&WebhookPayload { content })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::delivery(endpoint, e))?;
        Ok(())
    }
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Delivers messages to a fixed set of destinations.
pub struct Notifier<D> {
    destinations: Vec<Destination>,
    transport: D,
    /// Receives messages when no destination is configured (stdout by default)
    local: Mutex<Box<dyn Write + Send>>,
}

impl<D: Deliver> Notifier<D> {
    pub fn new(destinations: Vec<Destination>, transport: D) -> Self {
        Self {
            destinations,
            transport,
            local: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Replace the local reporting channel.
    pub fn with_local_output(mut self, out: impl Write + Send + 'static) -> Self {
        self.local = Mutex::new(Box::new(out));
        self
    }

    pub fn transport(&self) -> &D {
        &self.transport
    }

    /// Send `message` followed by `url` to every destination.
    ///
    /// With no destinations the message goes to the local output instead.
    pub async fn notify(&self, message: &str, url: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        if self.destinations.is_empty() {
            log::warn!("No webhook destinations configured. Printing message instead:");
            self.print_locally(message, url);
            return report;
        }

        for destination in &self.destinations {
            let content = destination.compose(message, url);
            match self.transport.deliver(&destination.endpoint, &content).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    log::error!("{e}");
                }
            }
        }

        report
    }

    fn print_locally(&self, message: &str, url: &str) {
        let written = match self.local.lock() {
            Ok(mut out) => writeln!(out, "{message}\n{url}").and_then(|_| out.flush()),
            Err(e) => {
                log::error!("Local output lock poisoned: {e}");
                return;
            }
        };
        if let Err(e) = written {
            log::error!("Could not print message locally: {e}");
        }
    }
}
