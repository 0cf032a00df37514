//! Library service integration.
//!
//! The library is the self-hosted manager that owns the comic files. The bot
//! only ever asks it to add volumes and start downloads; everything else is
//! read-only.

mod http;
mod types;

pub use http::{decode_envelope, HttpLibraryClient};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Library request timed out: {0}")]
    Timeout(String),

    #[error("Cannot reach library: {0}")]
    Connection(String),

    #[error("Library API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse library response: {0}")]
    Parse(String),

    #[error("Not found in library: {0}")]
    NotFound(String),

    #[error("Library client not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for LibraryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LibraryError::Timeout(e.to_string())
        } else if e.is_decode() {
            LibraryError::Parse(e.to_string())
        } else {
            LibraryError::Connection(e.to_string())
        }
    }
}

#[async_trait]
pub trait LibraryClient: Send + Sync {
    /// Catalog search proxied through the library, truncated to `limit`.
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LibrarySearchResult>, LibraryError>;

    /// Every tracked volume, sorted by title.
    async fn list_volumes(
        &self,
        filter: Option<VolumeFilter>,
    ) -> Result<Vec<LibraryVolume>, LibraryError>;

    /// Case-insensitive title match over the full volume list.
    async fn search_library(&self, query: &str) -> Result<Vec<LibraryVolume>, LibraryError> {
        let needle = query.to_lowercase();
        let matches: Vec<LibraryVolume> = self
            .list_volumes(None)
            .await?
            .into_iter()
            .filter(|v| v.title.to_lowercase().contains(&needle))
            .collect();
        info!("Found {} library volumes matching '{}'", matches.len(), query);
        Ok(matches)
    }

    /// `None` when the library does not know the id.
    async fn get_volume(&self, volume_id: u64) -> Result<Option<LibraryVolume>, LibraryError>;

    async fn add_volume(&self, request: &AddVolumeRequest) -> Result<AddOutcome, LibraryError>;

    async fn manual_search(&self, volume_id: u64) -> Result<Vec<DownloadOption>, LibraryError>;

    async fn download(
        &self,
        volume_id: u64,
        link: &str,
        force_match: bool,
    ) -> Result<(), LibraryError>;

    async fn rename_preview(&self, volume_id: u64) -> Result<Vec<RenameEntry>, LibraryError>;

    async fn stats(&self) -> Result<LibraryStats, LibraryError>;

    async fn about(&self) -> Result<AboutInfo, LibraryError>;

    async fn queue(&self) -> Result<Vec<QueueItem>, LibraryError>;

    /// Library-hosted cover image. No request is made.
    fn cover_url(&self, volume_id: u64) -> String;

    async fn check_connection(&self) -> bool {
        match self.about().await {
            Ok(about) => {
                info!("Connected to library {}", about.version);
                true
            }
            Err(e) => {
                warn!("Library connection check failed: {}", e);
                false
            }
        }
    }
}
