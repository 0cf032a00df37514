//! Mock library service for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::library::{
    AboutInfo, AddOutcome, AddVolumeRequest, CatalogId, DownloadOption, LibraryClient,
    LibraryError, LibrarySearchResult, LibraryStats, LibraryVolume, QueueItem, RenameEntry,
    VolumeFilter,
};

/// A recorded download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDownload {
    pub volume_id: u64,
    pub link: String,
    pub force_match: bool,
}

/// Mock implementation of the LibraryClient trait.
///
/// Holds an in-memory volume list and queue, records every call by
/// operation name, and can be told to fail the next call.
///
/// # Example
///
/// ```rust,ignore
/// let library = MockLibrary::new();
/// library.insert_volume(fixtures::library_volume(1, 4050, "Venom")).await;
///
/// let outcome = library.add_volume(&AddVolumeRequest { catalog_id: 4050, title: "Venom".into() }).await?;
/// assert!(matches!(outcome, AddOutcome::AlreadyExists { .. }));
/// ```
#[derive(Debug)]
pub struct MockLibrary {
    volumes: Arc<RwLock<Vec<LibraryVolume>>>,
    queue: Arc<RwLock<Vec<QueueItem>>>,
    search_results: Arc<RwLock<Vec<LibrarySearchResult>>>,
    download_options: Arc<RwLock<HashMap<u64, Vec<DownloadOption>>>>,
    rename_previews: Arc<RwLock<HashMap<u64, Vec<RenameEntry>>>>,
    /// Catalog ids whose add is refused, with the reason.
    rejections: Arc<RwLock<HashMap<u64, String>>>,
    added: Arc<RwLock<Vec<AddVolumeRequest>>>,
    downloads: Arc<RwLock<Vec<RecordedDownload>>>,
    calls: Arc<RwLock<Vec<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<LibraryError>>>,
    fail_manual_search: Arc<RwLock<bool>>,
    next_volume_id: AtomicU64,
}

impl Default for MockLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLibrary {
    pub fn new() -> Self {
        Self {
            volumes: Arc::new(RwLock::new(Vec::new())),
            queue: Arc::new(RwLock::new(Vec::new())),
            search_results: Arc::new(RwLock::new(Vec::new())),
            download_options: Arc::new(RwLock::new(HashMap::new())),
            rename_previews: Arc::new(RwLock::new(HashMap::new())),
            rejections: Arc::new(RwLock::new(HashMap::new())),
            added: Arc::new(RwLock::new(Vec::new())),
            downloads: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            fail_manual_search: Arc::new(RwLock::new(false)),
            next_volume_id: AtomicU64::new(1000),
        }
    }

    pub async fn insert_volume(&self, volume: LibraryVolume) {
        self.volumes.write().await.push(volume);
    }

    pub async fn volume_count(&self) -> usize {
        self.volumes.read().await.len()
    }

    pub async fn set_queue(&self, items: Vec<QueueItem>) {
        *self.queue.write().await = items;
    }

    pub async fn set_search_results(&self, results: Vec<LibrarySearchResult>) {
        *self.search_results.write().await = results;
    }

    pub async fn set_download_options(&self, volume_id: u64, options: Vec<DownloadOption>) {
        self.download_options.write().await.insert(volume_id, options);
    }

    pub async fn set_rename_preview(&self, volume_id: u64, entries: Vec<RenameEntry>) {
        self.rename_previews.write().await.insert(volume_id, entries);
    }

    /// Make adds of `catalog_id` come back rejected.
    pub async fn reject_add(&self, catalog_id: u64, reason: &str) {
        self.rejections
            .write()
            .await
            .insert(catalog_id, reason.to_string());
    }

    pub async fn fail_manual_search(&self, fail: bool) {
        *self.fail_manual_search.write().await = fail;
    }

    pub async fn set_next_error(&self, error: LibraryError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    /// Every add request received, including refused ones.
    pub async fn added_volumes(&self) -> Vec<AddVolumeRequest> {
        self.added.read().await.clone()
    }

    pub async fn downloads(&self) -> Vec<RecordedDownload> {
        self.downloads.read().await.clone()
    }

    /// Operation names in call order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self, operation: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.as_str() == operation)
            .count()
    }

    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
        self.added.write().await.clear();
        self.downloads.write().await.clear();
    }

    /// Record the call, then surface any injected error.
    async fn enter(&self, operation: &str) -> Result<(), LibraryError> {
        self.calls.write().await.push(operation.to_string());
        match self.next_error.write().await.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LibraryClient for MockLibrary {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LibrarySearchResult>, LibraryError> {
        self.enter("search").await?;
        let needle = query.to_lowercase();
        Ok(self
            .search_results
            .read()
            .await
            .iter()
            .filter(|r| needle.is_empty() || r.title.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_volumes(
        &self,
        filter: Option<VolumeFilter>,
    ) -> Result<Vec<LibraryVolume>, LibraryError> {
        self.enter("list_volumes").await?;
        let mut volumes: Vec<LibraryVolume> = self
            .volumes
            .read()
            .await
            .iter()
            .filter(|v| match filter {
                Some(VolumeFilter::Wanted) => v.monitored && v.issues_downloaded < v.issue_count,
                Some(VolumeFilter::Monitored) => v.monitored,
                None => true,
            })
            .cloned()
            .collect();
        volumes.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(volumes)
    }

    async fn get_volume(&self, volume_id: u64) -> Result<Option<LibraryVolume>, LibraryError> {
        self.enter("get_volume").await?;
        Ok(self
            .volumes
            .read()
            .await
            .iter()
            .find(|v| v.id == volume_id)
            .cloned())
    }

    async fn add_volume(&self, request: &AddVolumeRequest) -> Result<AddOutcome, LibraryError> {
        self.enter("add_volume").await?;
        self.added.write().await.push(request.clone());

        if let Some(reason) = self.rejections.read().await.get(&request.catalog_id) {
            return Ok(AddOutcome::Rejected {
                reason: reason.clone(),
            });
        }

        let mut volumes = self.volumes.write().await;
        if volumes
            .iter()
            .any(|v| v.catalog_id() == Some(request.catalog_id))
        {
            return Ok(AddOutcome::AlreadyExists {
                message: "UNIQUE constraint failed: volumes.comicvine_id".to_string(),
            });
        }

        let volume_id = self.next_volume_id.fetch_add(1, Ordering::SeqCst);
        volumes.push(LibraryVolume {
            id: volume_id,
            comicvine_id: Some(CatalogId::Numeric(request.catalog_id)),
            title: request.title.clone(),
            year: None,
            publisher: "Unknown".to_string(),
            issue_count: 0,
            issues_downloaded: 0,
            monitored: true,
            description: String::new(),
        });
        Ok(AddOutcome::Added { volume_id })
    }

    async fn manual_search(&self, volume_id: u64) -> Result<Vec<DownloadOption>, LibraryError> {
        self.enter("manual_search").await?;
        if *self.fail_manual_search.read().await {
            return Err(LibraryError::Timeout("manual search timed out".to_string()));
        }
        Ok(self
            .download_options
            .read()
            .await
            .get(&volume_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn download(
        &self,
        volume_id: u64,
        link: &str,
        force_match: bool,
    ) -> Result<(), LibraryError> {
        self.enter("download").await?;
        if !self.volumes.read().await.iter().any(|v| v.id == volume_id) {
            return Err(LibraryError::Api {
                status: 404,
                message: "VolumeNotFound".to_string(),
            });
        }
        self.downloads.write().await.push(RecordedDownload {
            volume_id,
            link: link.to_string(),
            force_match,
        });
        Ok(())
    }

    async fn rename_preview(&self, volume_id: u64) -> Result<Vec<RenameEntry>, LibraryError> {
        self.enter("rename_preview").await?;
        Ok(self
            .rename_previews
            .read()
            .await
            .get(&volume_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn stats(&self) -> Result<LibraryStats, LibraryError> {
        self.enter("stats").await?;
        let volumes = self.volumes.read().await;
        let monitored = volumes.iter().filter(|v| v.monitored).count() as u64;
        Ok(LibraryStats {
            volumes: volumes.len() as u64,
            issues: volumes.iter().map(|v| v.issue_count).sum(),
            downloaded_issues: volumes.iter().map(|v| v.issues_downloaded).sum(),
            monitored,
            unmonitored: volumes.len() as u64 - monitored,
            files: volumes.iter().map(|v| v.issues_downloaded).sum(),
            total_file_size: 0,
        })
    }

    async fn about(&self) -> Result<AboutInfo, LibraryError> {
        self.enter("about").await?;
        Ok(AboutInfo {
            version: "mock-1.0".to_string(),
        })
    }

    async fn queue(&self) -> Result<Vec<QueueItem>, LibraryError> {
        self.enter("queue").await?;
        Ok(self.queue.read().await.clone())
    }

    fn cover_url(&self, volume_id: u64) -> String {
        format!("http://mock-library/api/volumes/{}/cover", volume_id)
    }
}
