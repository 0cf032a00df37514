//! Mock catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{CatalogError, CatalogVolume, ComicCatalog, VolumeQuery};

/// Mock implementation of the ComicCatalog trait.
///
/// Results are keyed by publisher id; queries without a publisher get the
/// broad result list. Every query is recorded.
#[derive(Debug)]
pub struct MockCatalog {
    by_publisher: Arc<RwLock<HashMap<u64, Vec<CatalogVolume>>>>,
    broad: Arc<RwLock<Vec<CatalogVolume>>>,
    covers: Arc<RwLock<HashMap<u64, Option<String>>>>,
    queries: Arc<RwLock<Vec<VolumeQuery>>>,
    next_error: Arc<RwLock<Option<CatalogError>>>,
    connected: Arc<RwLock<bool>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            by_publisher: Arc::new(RwLock::new(HashMap::new())),
            broad: Arc::new(RwLock::new(Vec::new())),
            covers: Arc::new(RwLock::new(HashMap::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            connected: Arc::new(RwLock::new(true)),
        }
    }

    pub async fn set_publisher_results(&self, publisher_id: u64, volumes: Vec<CatalogVolume>) {
        self.by_publisher.write().await.insert(publisher_id, volumes);
    }

    pub async fn set_broad_results(&self, volumes: Vec<CatalogVolume>) {
        *self.broad.write().await = volumes;
    }

    pub async fn set_cover(&self, catalog_id: u64, url: Option<String>) {
        self.covers.write().await.insert(catalog_id, url);
    }

    pub async fn set_connected(&self, connected: bool) {
        *self.connected.write().await = connected;
    }

    /// The next search fails with this error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn queries(&self) -> Vec<VolumeQuery> {
        self.queries.read().await.clone()
    }

    pub async fn clear_recorded(&self) {
        self.queries.write().await.clear();
    }
}

#[async_trait]
impl ComicCatalog for MockCatalog {
    async fn search_volumes(&self, query: &VolumeQuery) -> Result<Vec<CatalogVolume>, CatalogError> {
        self.queries.write().await.push(query.clone());
        if let Some(e) = self.next_error.write().await.take() {
            return Err(e);
        }
        if !*self.connected.read().await {
            return Err(CatalogError::Connection("mock catalog offline".to_string()));
        }

        let volumes = match query.publisher_id {
            Some(id) => self
                .by_publisher
                .read()
                .await
                .get(&id)
                .cloned()
                .unwrap_or_default(),
            None => self.broad.read().await.clone(),
        };
        Ok(volumes.into_iter().take(query.limit as usize).collect())
    }

    async fn cover_url(&self, catalog_id: u64) -> Result<Option<String>, CatalogError> {
        if !*self.connected.read().await {
            return Err(CatalogError::Connection("mock catalog offline".to_string()));
        }
        Ok(self
            .covers
            .read()
            .await
            .get(&catalog_id)
            .cloned()
            .flatten())
    }

    async fn check_connection(&self) -> bool {
        *self.connected.read().await
    }
}
