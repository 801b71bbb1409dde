/*!
 * Reviewer alert delivery.
 *
 * Channels:
 * - `LogNotifier` - writes the alert to the log
 * - `WebhookNotifier` - POSTs the alert as JSON
 * - `RecordingNotifier` - keeps alerts in memory, optionally failing, for tests
 *
 * Callers treat delivery as best effort: failures are logged and swallowed.
 */

use async_trait::async_trait;
use futures::future::join_all;
use log::{error, info, warn};
use parking_lot::Mutex;
use reqwest::Client;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::NotificationConfig;
use crate::errors::NotificationError;
use crate::models::Priority;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub subject: String,
    pub message: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_id: Option<String>,
}

#[async_trait]
pub trait NotificationChannel: Send + Sync + Debug {
    async fn notify(&self, alert: &Alert) -> Result<(), NotificationError>;

    fn name(&self) -> &str;
}

/// Deliver to every channel concurrently, returning how many acknowledged
pub async fn broadcast(channels: &[Arc<dyn NotificationChannel>], alert: &Alert) -> usize {
    let results = join_all(channels.iter().map(|channel| channel.notify(alert))).await;

    let mut sent = 0;
    for (channel, result) in channels.iter().zip(results) {
        match result {
            Ok(()) => sent += 1,
            Err(e) => warn!("Notification via {} failed: {}", channel.name(), e),
        }
    }
    sent
}

/// Channels described by the configuration; the log channel is always present
pub fn channels_from_config(config: &NotificationConfig) -> Vec<Arc<dyn NotificationChannel>> {
    let mut channels: Vec<Arc<dyn NotificationChannel>> = vec![Arc::new(LogNotifier)];
    if let Some(url) = &config.webhook_url {
        channels.push(Arc::new(WebhookNotifier::new(
            url.clone(),
            Duration::from_millis(config.timeout_ms),
        )));
    }
    channels
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationChannel for LogNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), NotificationError> {
        match alert.priority {
            Priority::Critical => error!("{}: {}", alert.subject, alert.message),
            Priority::High => warn!("{}: {}", alert.subject, alert.message),
            _ => info!("{}: {}", alert.subject, alert.message),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.url)
            .json(alert)
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::Delivery(format!(
                "webhook answered {}",
                status.as_u16()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

/// In-memory channel; clones share the recorded alerts
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    alerts: Arc<Mutex<Vec<Alert>>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records nothing and fails every delivery
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), NotificationError> {
        if self.failing {
            return Err(NotificationError::Delivery("recording channel set to fail".to_string()));
        }
        self.alerts.lock().push(alert.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
