//! Catalog service integration (metadata provider for comic volumes).

mod comicvine;
mod types;

pub use comicvine::ComicVineClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request timed out: {0}")]
    Timeout(String),

    #[error("Cannot reach catalog: {0}")]
    Connection(String),

    #[error("Catalog rate limit exceeded")]
    RateLimited,

    #[error("Catalog API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse catalog response: {0}")]
    Parse(String),

    #[error("Not found in catalog: {0}")]
    NotFound(String),

    #[error("Catalog client not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout(e.to_string())
        } else if e.is_decode() {
            CatalogError::Parse(e.to_string())
        } else {
            CatalogError::Connection(e.to_string())
        }
    }
}

#[async_trait]
pub trait ComicCatalog: Send + Sync {
    /// Records without an id are dropped; everything else is defaulted.
    async fn search_volumes(&self, query: &VolumeQuery) -> Result<Vec<CatalogVolume>, CatalogError>;

    /// Best available cover for a volume, `None` if it has no image.
    async fn cover_url(&self, catalog_id: u64) -> Result<Option<String>, CatalogError>;

    async fn check_connection(&self) -> bool;
}
