//! Download notifications.

mod webhook;

pub use webhook::WebhookNotifier;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::NotificationConfig;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification request failed: {0}")]
    Request(String),

    #[error("Notification target rejected the message: HTTP {status}")]
    Rejected { status: u16 },

    #[error("Notifier not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::Request(e.to_string())
    }
}

/// Coarse grouping of queue statuses for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Downloaded,
    Downloading,
    Failed,
    Other,
}

impl NotificationKind {
    pub fn headline(&self) -> &'static str {
        match self {
            NotificationKind::Downloaded => "Comic downloaded",
            NotificationKind::Downloading => "Comic downloading",
            NotificationKind::Failed => "Comic download failed",
            NotificationKind::Other => "Comic download update",
        }
    }
}

/// Everything known about one queue transition worth announcing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadNotification {
    pub kind: NotificationKind,
    /// Queue status as reported, lowercased.
    pub status: String,
    pub download_id: u64,
    pub volume_id: u64,
    pub volume_title: String,
    pub volume_year: Option<i64>,
    pub publisher: String,
    pub monitored: bool,
    pub issues_downloaded: u64,
    pub issue_count: u64,
    pub release_title: String,
    pub release_subtitle: Option<String>,
    pub source_name: String,
    pub source_type: String,
    pub size_bytes: Option<u64>,
    /// Percent, only while actively downloading.
    pub progress: Option<f64>,
    /// Bytes per second, only while actively downloading.
    pub speed: Option<f64>,
    /// Only once the download has finished.
    pub file_name: Option<String>,
    pub catalog_url: Option<String>,
    pub source_link: Option<String>,
    pub cover_url: Option<String>,
}

impl DownloadNotification {
    /// One-line plain text rendering.
    pub fn summary(&self) -> String {
        let mut text = format!("{}: {}", self.kind.headline(), self.volume_title);
        if let Some(year) = self.volume_year {
            text.push_str(&format!(" ({})", year));
        }
        if let Some(progress) = self.progress {
            text.push_str(&format!(" - {:.0}%", progress));
            if let Some(speed) = self.speed.filter(|s| *s > 0.0) {
                text.push_str(&format!(" at {}/s", format_size(speed as u64)));
            }
        }
        if let Some(size) = self.size_bytes {
            text.push_str(&format!(" [{}]", format_size(size)));
        }
        text
    }
}

/// Human-readable byte count, e.g. `1.5 GB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_download(&self, notification: &DownloadNotification) -> Result<(), NotifyError>;

    fn name(&self) -> &'static str;
}

/// Writes notifications to the log. Used when no webhook is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_download(&self, notification: &DownloadNotification) -> Result<(), NotifyError> {
        info!(
            download_id = notification.download_id,
            volume_id = notification.volume_id,
            status = %notification.status,
            "{}",
            notification.summary()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

pub fn create_notifier(config: &NotificationConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.webhook_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(Arc::new(WebhookNotifier::new(url)?)),
        _ => Ok(Arc::new(LogNotifier)),
    }
}
