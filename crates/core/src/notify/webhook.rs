use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{DownloadNotification, Notifier, NotifyError};
use crate::metrics;

const WEBHOOK_TIMEOUT_SECS: u64 = 10;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: String,
    notification: &'a DownloadNotification,
}

/// Posts each notification as JSON to a fixed URL.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(NotifyError::NotConfigured(
                "notifications.webhook_url is empty".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_download(&self, notification: &DownloadNotification) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            text: notification.summary(),
            notification,
        };
        let start = Instant::now();
        let outcome = async {
            let response = self.client.post(&self.url).json(&payload).send().await?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(NotifyError::Rejected {
                    status: status.as_u16(),
                })
            }
        }
        .await;

        metrics::observe_request("webhook", "notify", outcome.is_ok(), start.elapsed());
        if outcome.is_ok() {
            debug!("Webhook delivered for download {}", notification.download_id);
        }
        outcome
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_url_rejected() {
        assert!(matches!(
            WebhookNotifier::new(" "),
            Err(NotifyError::NotConfigured(_))
        ));
    }
}
