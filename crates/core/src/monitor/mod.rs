//! The monitor ties the catalog and the library together: it discovers new
//! series, adds them, and announces download progress.
//!
//! # Example
//!
//! ```rust,ignore
//! let monitor = ComicMonitor::new(catalog, library, notifier, clock, &config);
//! let result = monitor.check_and_add_new_comics(7).await;
//! println!("{}", result.summary());
//! ```

mod acquisition;
mod cache;
mod discovery;
mod filters;
mod ledger;
mod publishers;
mod queue;

pub use acquisition::{AcquisitionSettings, AcquisitionWorkflow, DiscoveryRunResult};
pub use cache::ExistingLibraryCache;
pub use discovery::{ReleaseDiscovery, FALLBACK_THRESHOLD, PER_QUERY_LIMIT};
pub use filters::{dedupe_by_id, is_new_series, EXCLUDED_TERMS, MAX_SERIES_AGE_YEARS};
pub use ledger::{LedgerDecision, LedgerKey, NotificationLedger};
pub use publishers::{is_monitored, matches_publisher, MonitoredPublisher, MONITORED_PUBLISHERS};
pub use queue::{ItemOutcome, PollSummary, QueuePoller, QueueStatus};

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::catalog::{CatalogVolume, ComicCatalog};
use crate::clock::Clock;
use crate::config::Config;
use crate::library::{LibraryClient, LibraryError};
use crate::metrics;
use crate::notify::Notifier;

/// Most entries returned by [`ComicMonitor::recent_additions`].
pub const RECENT_ADDITIONS_LIMIT: usize = 20;

/// A discovered series and whether the library already has it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentAddition {
    pub catalog_id: u64,
    pub title: String,
    pub publisher: String,
    pub start_year: Option<i64>,
    pub issue_count: u64,
    pub catalog_url: String,
    pub cover_url: Option<String>,
    pub in_library: bool,
}

impl RecentAddition {
    fn new(volume: &CatalogVolume, in_library: bool) -> Self {
        Self {
            catalog_id: volume.id,
            title: volume.display_name().to_string(),
            publisher: volume.publisher_name().to_string(),
            start_year: volume.start_year,
            issue_count: volume.issue_count,
            catalog_url: volume.catalog_url(),
            cover_url: volume.cover_url().map(str::to_string),
            in_library,
        }
    }
}

/// Reachability of both upstream services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub library: bool,
    pub catalog: bool,
}

impl ServiceStatus {
    pub fn all_up(&self) -> bool {
        self.library && self.catalog
    }
}

pub struct ComicMonitor {
    catalog: Arc<dyn ComicCatalog>,
    library: Arc<dyn LibraryClient>,
    clock: Arc<dyn Clock>,
    cache: Arc<ExistingLibraryCache>,
    discovery: ReleaseDiscovery,
    acquisition: AcquisitionWorkflow,
    queue: QueuePoller,
    /// Serialises discovery runs from the scheduler and the command surface.
    run_lock: Mutex<()>,
}

impl ComicMonitor {
    pub fn new(
        catalog: Arc<dyn ComicCatalog>,
        library: Arc<dyn LibraryClient>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        let monitor = &config.monitor;
        let cache = Arc::new(ExistingLibraryCache::new(
            Arc::clone(&library),
            Arc::clone(&clock),
            monitor.cache_ttl(),
        ));
        let discovery = ReleaseDiscovery::new(
            Arc::clone(&catalog),
            Arc::clone(&clock),
            monitor.publisher_pause(),
        );
        let acquisition = AcquisitionWorkflow::new(
            Arc::clone(&library),
            Arc::clone(&cache),
            Arc::clone(&clock),
            AcquisitionSettings {
                item_pause: monitor.item_pause(),
                search_pause: monitor.search_pause(),
                auto_search: monitor.auto_search,
            },
        );
        let queue = QueuePoller::new(
            Arc::clone(&library),
            Arc::clone(&catalog),
            notifier,
            Arc::clone(&clock),
            monitor.renotify_window(),
            config.notifications.enabled,
        );

        Self {
            catalog,
            library,
            clock,
            cache,
            discovery,
            acquisition,
            queue,
            run_lock: Mutex::new(()),
        }
    }

    pub fn library(&self) -> &Arc<dyn LibraryClient> {
        &self.library
    }

    pub fn catalog(&self) -> &Arc<dyn ComicCatalog> {
        &self.catalog
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn cache(&self) -> &ExistingLibraryCache {
        &self.cache
    }

    pub async fn existing_ids(&self) -> HashSet<u64> {
        self.cache.get_existing_ids().await
    }

    /// Candidate new series without touching the library.
    pub async fn search_new_releases(&self, days_back: u32) -> Vec<CatalogVolume> {
        self.discovery.discover(days_back).await
    }

    /// Discover new series and add the ones the library lacks.
    pub async fn check_and_add_new_comics(&self, days_back: u32) -> DiscoveryRunResult {
        let _guard = self.run_lock.lock().await;
        info!("Checking for new comics from the last {} days", days_back);

        let candidates = self.discovery.discover(days_back).await;
        if candidates.is_empty() {
            info!("No new series found");
            metrics::DISCOVERY_RUNS
                .with_label_values(&["no_candidates"])
                .inc();
            return DiscoveryRunResult::default();
        }

        let result = self.acquisition.acquire(&candidates).await;
        let label = if result.added_successfully > 0 {
            "added"
        } else {
            "nothing_added"
        };
        metrics::DISCOVERY_RUNS.with_label_values(&[label]).inc();
        info!("Discovery run complete: {}", result.summary());
        result
    }

    /// Up to [`RECENT_ADDITIONS_LIMIT`] discovered series, flagged by presence.
    pub async fn recent_additions(&self, days_back: u32) -> Vec<RecentAddition> {
        let candidates = self.discovery.discover(days_back).await;
        if candidates.is_empty() {
            return Vec::new();
        }
        let existing = self.cache.get_existing_ids().await;
        candidates
            .iter()
            .take(RECENT_ADDITIONS_LIMIT)
            .map(|v| RecentAddition::new(v, existing.contains(&v.id)))
            .collect()
    }

    pub async fn poll_queue(&self) -> Result<PollSummary, LibraryError> {
        self.queue.poll().await
    }

    pub async fn check_services(&self) -> ServiceStatus {
        let (library, catalog) =
            tokio::join!(self.library.check_connection(), self.catalog.check_connection());
        ServiceStatus { library, catalog }
    }
}
