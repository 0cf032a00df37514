//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notify::{DownloadNotification, Notifier, NotifyError};

/// Collects delivered notifications. `fail_next` makes the next delivery
/// fail without being collected.
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Arc<RwLock<Vec<DownloadNotification>>>,
    fail_next: Arc<RwLock<bool>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<DownloadNotification> {
        self.sent.read().await.clone()
    }

    pub async fn fail_next(&self, fail: bool) {
        *self.fail_next.write().await = fail;
    }

    pub async fn clear(&self) {
        self.sent.write().await.clear();
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify_download(&self, notification: &DownloadNotification) -> Result<(), NotifyError> {
        let mut fail = self.fail_next.write().await;
        if *fail {
            *fail = false;
            return Err(NotifyError::Rejected { status: 500 });
        }
        self.sent.write().await.push(notification.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
