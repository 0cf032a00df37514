//! Polling the library download queue and announcing status changes.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ledger::{LedgerKey, NotificationLedger};
use crate::catalog::{catalog_volume_url, ComicCatalog};
use crate::clock::Clock;
use crate::library::{LibraryClient, LibraryError, LibraryVolume, QueueItem};
use crate::metrics;
use crate::notify::{DownloadNotification, NotificationKind, Notifier};

/// Longest file name carried in a notification.
const MAX_FILE_NAME_CHARS: usize = 50;

/// Download status as reported by the library queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueStatus {
    Queued,
    Downloading,
    Snatched,
    Grabbed,
    Completed,
    Importing,
    Finished,
    Failed,
    Canceled,
    Other(String),
}

impl QueueStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "queued" => QueueStatus::Queued,
            "downloading" => QueueStatus::Downloading,
            "snatched" => QueueStatus::Snatched,
            "grabbed" => QueueStatus::Grabbed,
            "completed" => QueueStatus::Completed,
            "importing" => QueueStatus::Importing,
            "finished" => QueueStatus::Finished,
            "failed" => QueueStatus::Failed,
            "canceled" | "cancelled" => QueueStatus::Canceled,
            other => QueueStatus::Other(other.to_string()),
        }
    }

    /// Still moving bytes; progress is meaningful.
    pub fn is_active(&self) -> bool {
        matches!(self, QueueStatus::Queued | QueueStatus::Downloading)
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            QueueStatus::Completed | QueueStatus::Importing | QueueStatus::Finished
        )
    }

    pub fn should_notify(&self) -> bool {
        !matches!(self, QueueStatus::Other(_))
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            QueueStatus::Completed | QueueStatus::Importing | QueueStatus::Finished => {
                NotificationKind::Downloaded
            }
            QueueStatus::Queued
            | QueueStatus::Downloading
            | QueueStatus::Snatched
            | QueueStatus::Grabbed => NotificationKind::Downloading,
            QueueStatus::Failed | QueueStatus::Canceled => NotificationKind::Failed,
            QueueStatus::Other(_) => NotificationKind::Other,
        }
    }
}

/// What happened to a single queue item during a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Missing ids or an uninteresting status.
    Ignored,
    Suppressed,
    /// Volume details unavailable; retried next poll.
    Deferred,
    Notified,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    pub items: usize,
    pub notified: usize,
    pub suppressed: usize,
    pub deferred: usize,
}

pub struct QueuePoller {
    library: Arc<dyn LibraryClient>,
    catalog: Arc<dyn ComicCatalog>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    notifications_enabled: bool,
    ledger: Mutex<NotificationLedger>,
}

impl QueuePoller {
    pub fn new(
        library: Arc<dyn LibraryClient>,
        catalog: Arc<dyn ComicCatalog>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        renotify_window: chrono::Duration,
        notifications_enabled: bool,
    ) -> Self {
        let ledger = NotificationLedger::new(renotify_window, clock.now());
        Self {
            library,
            catalog,
            notifier,
            clock,
            notifications_enabled,
            ledger: Mutex::new(ledger),
        }
    }

    /// Fetch the queue and announce whatever the ledger lets through.
    pub async fn poll(&self) -> Result<PollSummary, LibraryError> {
        let items = match self.library.queue().await {
            Ok(items) => {
                metrics::QUEUE_POLLS.with_label_values(&["ok"]).inc();
                items
            }
            Err(e) => {
                metrics::QUEUE_POLLS.with_label_values(&["error"]).inc();
                return Err(e);
            }
        };

        self.ledger.lock().await.sweep(self.clock.now());

        let mut summary = PollSummary {
            items: items.len(),
            ..Default::default()
        };
        for item in &items {
            match self.process_item(item).await {
                ItemOutcome::Notified => summary.notified += 1,
                ItemOutcome::Suppressed => summary.suppressed += 1,
                ItemOutcome::Deferred => summary.deferred += 1,
                ItemOutcome::Ignored => {}
            }
        }
        if summary.notified > 0 {
            info!(
                "Queue poll: {} items, {} notified",
                summary.items, summary.notified
            );
        }
        Ok(summary)
    }

    pub async fn process_item(&self, item: &QueueItem) -> ItemOutcome {
        let (Some(download_id), Some(volume_id)) = (item.id, item.volume_id) else {
            debug!("Queue item without ids: {}", item.title);
            return ItemOutcome::Ignored;
        };
        let status = QueueStatus::parse(&item.status);
        if !status.should_notify() {
            return ItemOutcome::Ignored;
        }

        let key = LedgerKey::new(download_id, &item.status);
        let decision = self
            .ledger
            .lock()
            .await
            .check(&key, item.progress, self.clock.now());
        if !decision.should_notify() {
            metrics::NOTIFICATIONS_SUPPRESSED.inc();
            return ItemOutcome::Suppressed;
        }

        let volume = match self.library.get_volume(volume_id).await {
            Ok(Some(volume)) => volume,
            Ok(None) => {
                debug!("Volume {} not found for download {}", volume_id, download_id);
                return ItemOutcome::Deferred;
            }
            Err(e) => {
                warn!("Could not load volume {}: {}", volume_id, e);
                return ItemOutcome::Deferred;
            }
        };

        if self.notifications_enabled {
            let notification = self
                .build_notification(item, download_id, &status, &volume)
                .await;
            if let Err(e) = self.notifier.notify_download(&notification).await {
                warn!(
                    "{} notifier failed for download {}: {}",
                    self.notifier.name(),
                    download_id,
                    e
                );
            }
            metrics::NOTIFICATIONS_SENT
                .with_label_values(&[key.status.as_str()])
                .inc();
        }

        self.ledger.lock().await.record(key, self.clock.now());
        ItemOutcome::Notified
    }

    async fn build_notification(
        &self,
        item: &QueueItem,
        download_id: u64,
        status: &QueueStatus,
        volume: &LibraryVolume,
    ) -> DownloadNotification {
        let active = status.is_active() && item.progress > 0.0;
        let catalog_id = volume.catalog_id();

        DownloadNotification {
            kind: status.kind(),
            status: item.status.to_lowercase(),
            download_id,
            volume_id: volume.id,
            volume_title: volume.title.clone(),
            volume_year: volume.year,
            publisher: volume.publisher.clone(),
            monitored: volume.monitored,
            issues_downloaded: volume.issues_downloaded,
            issue_count: volume.issue_count,
            release_title: item.release_title().to_string(),
            release_subtitle: non_empty(&item.web_sub_title),
            source_name: item.source_name.clone(),
            source_type: item.source_type.clone(),
            size_bytes: (item.size > 0).then_some(item.size),
            progress: active.then_some(item.progress),
            speed: active.then_some(item.speed),
            file_name: if status.is_finished() {
                file_name(&item.file)
            } else {
                None
            },
            catalog_url: catalog_id.map(catalog_volume_url),
            source_link: non_empty(&item.web_link),
            cover_url: Some(self.cover_url(volume, catalog_id).await),
        }
    }

    /// Library cover, replaced by the catalog's when it has one.
    async fn cover_url(&self, volume: &LibraryVolume, catalog_id: Option<u64>) -> String {
        let fallback = self.library.cover_url(volume.id);
        let Some(catalog_id) = catalog_id else {
            return fallback;
        };
        match self.catalog.cover_url(catalog_id).await {
            Ok(Some(url)) => url,
            Ok(None) => fallback,
            Err(e) => {
                debug!("Catalog cover for {} unavailable: {}", catalog_id, e);
                fallback
            }
        }
    }

    pub async fn ledger_len(&self) -> usize {
        self.ledger.lock().await.len()
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Base name of a path, cut to a displayable length.
fn file_name(path: &str) -> Option<String> {
    let base = path.rsplit(&['/', '\\'][..]).next().unwrap_or(path);
    let base = non_empty(base)?;
    if base.chars().count() > MAX_FILE_NAME_CHARS {
        let cut: String = base.chars().take(MAX_FILE_NAME_CHARS - 3).collect();
        Some(format!("{}...", cut))
    } else {
        Some(base)
    }
}
