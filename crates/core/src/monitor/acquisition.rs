//! Adding discovered volumes to the library.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::cache::ExistingLibraryCache;
use super::publishers::is_monitored;
use crate::catalog::CatalogVolume;
use crate::clock::Clock;
use crate::library::{AddOutcome, AddVolumeRequest, LibraryClient};
use crate::metrics;

/// Tally of one discovery-and-add run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryRunResult {
    /// Candidates considered.
    pub checked: usize,
    /// Candidates not already in the library.
    pub new_found: usize,
    pub added_successfully: usize,
    pub failed_to_add: usize,
    pub already_exists: usize,
    /// One human-readable line per candidate.
    pub details: Vec<String>,
}

impl DiscoveryRunResult {
    pub fn summary(&self) -> String {
        format!(
            "checked {}, new {}, added {}, failed {}, already present {}",
            self.checked,
            self.new_found,
            self.added_successfully,
            self.failed_to_add,
            self.already_exists
        )
    }
}

/// Pauses and toggles for [`AcquisitionWorkflow`].
#[derive(Debug, Clone)]
pub struct AcquisitionSettings {
    pub item_pause: Duration,
    pub search_pause: Duration,
    pub auto_search: bool,
}

pub struct AcquisitionWorkflow {
    library: Arc<dyn LibraryClient>,
    cache: Arc<ExistingLibraryCache>,
    clock: Arc<dyn Clock>,
    settings: AcquisitionSettings,
}

impl AcquisitionWorkflow {
    pub fn new(
        library: Arc<dyn LibraryClient>,
        cache: Arc<ExistingLibraryCache>,
        clock: Arc<dyn Clock>,
        settings: AcquisitionSettings,
    ) -> Self {
        Self {
            library,
            cache,
            clock,
            settings,
        }
    }

    /// Add every candidate the library does not already have.
    ///
    /// Never fails as a whole: each candidate's outcome lands in the tally.
    pub async fn acquire(&self, candidates: &[CatalogVolume]) -> DiscoveryRunResult {
        let mut result = DiscoveryRunResult {
            checked: candidates.len(),
            ..Default::default()
        };
        if candidates.is_empty() {
            return result;
        }

        let existing = self.cache.get_existing_ids().await;
        let (present, fresh): (Vec<&CatalogVolume>, Vec<&CatalogVolume>) =
            candidates.iter().partition(|v| existing.contains(&v.id));
        result.already_exists = present.len();
        result.new_found = fresh.len();
        for volume in &present {
            debug!("{} already in library", volume.display_name());
            metrics::VOLUMES_ACQUIRED
                .with_label_values(&["already_exists"])
                .inc();
        }

        for (n, volume) in fresh.iter().enumerate() {
            if n > 0 {
                self.clock.sleep(self.settings.item_pause).await;
            }
            self.process(volume, &mut result).await;
        }

        if result.added_successfully > 0 {
            self.cache.invalidate().await;
        }
        info!("Acquisition finished: {}", result.summary());
        result
    }

    async fn process(&self, volume: &CatalogVolume, result: &mut DiscoveryRunResult) {
        let title = volume.display_name().to_string();

        if !is_monitored(volume) {
            result.failed_to_add += 1;
            result.details.push(format!(
                "Skipped {}: publisher {} is not monitored",
                title,
                volume.publisher_name()
            ));
            metrics::VOLUMES_ACQUIRED.with_label_values(&["failed"]).inc();
            return;
        }

        let request = AddVolumeRequest {
            catalog_id: volume.id,
            title: title.clone(),
        };
        match self.library.add_volume(&request).await {
            Ok(AddOutcome::Added { volume_id }) => {
                info!("Added {} as library volume {}", title, volume_id);
                result.added_successfully += 1;
                result.details.push(format!(
                    "Added: {} ({})",
                    title,
                    volume.publisher_name()
                ));
                self.cache.insert(volume.id).await;
                metrics::VOLUMES_ACQUIRED.with_label_values(&["added"]).inc();

                if self.settings.auto_search {
                    self.clock.sleep(self.settings.search_pause).await;
                    self.auto_search(volume_id, &title).await;
                }
            }
            Ok(AddOutcome::AlreadyExists { message }) => {
                debug!("Library already had {}: {}", title, message);
                result.already_exists += 1;
                result.details.push(format!("Already in library: {}", title));
                self.cache.insert(volume.id).await;
                metrics::VOLUMES_ACQUIRED
                    .with_label_values(&["already_exists"])
                    .inc();
            }
            Ok(AddOutcome::Rejected { reason }) => {
                warn!("Library rejected {}: {}", title, reason);
                result.failed_to_add += 1;
                result
                    .details
                    .push(format!("Failed to add {}: {}", title, reason));
                metrics::VOLUMES_ACQUIRED.with_label_values(&["failed"]).inc();
            }
            Err(e) => {
                warn!("Adding {} failed: {}", title, e);
                result.failed_to_add += 1;
                result.details.push(format!("Failed to add {}: {}", title, e));
                metrics::VOLUMES_ACQUIRED.with_label_values(&["failed"]).inc();
            }
        }
    }

    /// Ask the library what it can download for a fresh volume. Advisory only.
    async fn auto_search(&self, volume_id: u64, title: &str) {
        match self.library.manual_search(volume_id).await {
            Ok(options) => {
                let matches = options.iter().filter(|o| o.is_match).count();
                info!(
                    "Search for {}: {} options, {} matching",
                    title,
                    options.len(),
                    matches
                );
            }
            Err(e) => warn!("Search for {} failed: {}", title, e),
        }
    }
}
