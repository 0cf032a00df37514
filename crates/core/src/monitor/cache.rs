//! Catalog ids already present in the library, cached with a TTL.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::library::{LibraryClient, LibraryError};
use crate::metrics;

#[derive(Debug, Default)]
struct CacheState {
    ids: HashSet<u64>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Set of catalog ids the library already tracks.
///
/// Only a successful refresh marks the cache as populated, and an empty
/// library counts as a successful refresh. Failed refreshes leave it stale
/// so the next read tries again.
pub struct ExistingLibraryCache {
    library: Arc<dyn LibraryClient>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    state: RwLock<CacheState>,
}

impl ExistingLibraryCache {
    pub fn new(library: Arc<dyn LibraryClient>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            library,
            clock,
            ttl,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Current id set, refreshed first if stale. Degrades to an empty set
    /// when the library cannot be read.
    pub async fn get_existing_ids(&self) -> HashSet<u64> {
        let now = self.clock.now();
        {
            let state = self.state.read().await;
            if let Some(at) = state.refreshed_at {
                if now - at < self.ttl {
                    debug!("Library cache hit ({} ids)", state.ids.len());
                    return state.ids.clone();
                }
            }
        }

        match self.load().await {
            Ok(ids) => {
                info!("Library cache refreshed: {} volumes", ids.len());
                metrics::LIBRARY_CACHE_SIZE.set(ids.len() as i64);
                let mut state = self.state.write().await;
                state.ids = ids.clone();
                state.refreshed_at = Some(self.clock.now());
                ids
            }
            Err(e) => {
                warn!("Could not load existing library volumes: {}", e);
                HashSet::new()
            }
        }
    }

    /// Membership in the cached set, without refreshing.
    #[cfg(test)]
    pub(crate) async fn contains(&self, catalog_id: u64) -> bool {
        self.state.read().await.ids.contains(&catalog_id)
    }

    /// Record an id the library just accepted, ahead of the next refresh.
    pub async fn insert(&self, catalog_id: u64) {
        let mut state = self.state.write().await;
        if state.ids.insert(catalog_id) {
            metrics::LIBRARY_CACHE_SIZE.set(state.ids.len() as i64);
        }
    }

    /// Drop every cached id and force the next read to refresh.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.ids.clear();
        state.refreshed_at = None;
        metrics::LIBRARY_CACHE_SIZE.set(0);
        debug!("Library cache invalidated");
    }

    #[cfg(test)]
    pub(crate) async fn is_fresh(&self) -> bool {
        match self.state.read().await.refreshed_at {
            Some(at) => self.clock.now() - at < self.ttl,
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.ids.len()
    }

    async fn load(&self) -> Result<HashSet<u64>, LibraryError> {
        let about = self.library.about().await?;
        debug!("Loading library volumes from version {}", about.version);

        match self.library.stats().await {
            Ok(stats) if stats.volumes == 0 => {
                info!("Library reports no volumes");
                return Ok(HashSet::new());
            }
            Ok(stats) => debug!("Library reports {} volumes", stats.volumes),
            Err(e) => warn!("Library stats unavailable, listing anyway: {}", e),
        }

        let volumes = self.library.list_volumes(None).await?;
        let mut ids = HashSet::with_capacity(volumes.len());
        for volume in &volumes {
            match volume.catalog_id() {
                Some(id) => {
                    ids.insert(id);
                }
                None => debug!(
                    "Skipping library volume {} with unusable catalog id {:?}",
                    volume.id, volume.comicvine_id
                ),
            }
        }
        Ok(ids)
    }
}
