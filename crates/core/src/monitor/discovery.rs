//! Finding newly added series from the monitored publishers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use tracing::{debug, info, warn};

use super::filters::{dedupe_by_id, is_new_series};
use super::publishers::{is_monitored, matches_publisher, MonitoredPublisher, MONITORED_PUBLISHERS};
use crate::catalog::{CatalogVolume, ComicCatalog, DateRange, VolumeQuery};
use crate::clock::Clock;
use crate::metrics;

/// Results requested per catalog query.
pub const PER_QUERY_LIMIT: u32 = 100;

/// Below this many candidates the broad fallback query runs.
pub const FALLBACK_THRESHOLD: usize = 5;

pub struct ReleaseDiscovery {
    catalog: Arc<dyn ComicCatalog>,
    clock: Arc<dyn Clock>,
    /// Pause between catalog queries.
    query_pause: Duration,
}

impl ReleaseDiscovery {
    pub fn new(catalog: Arc<dyn ComicCatalog>, clock: Arc<dyn Clock>, query_pause: Duration) -> Self {
        Self {
            catalog,
            clock,
            query_pause,
        }
    }

    /// New series from the monitored publishers added in the last `days_back`
    /// days, unique by catalog id. Catalog failures shrink the result; they
    /// never fail the run.
    pub async fn discover(&self, days_back: u32) -> Vec<CatalogVolume> {
        let now = self.clock.now();
        let range = DateRange::last_days(now, days_back);
        let year = now.year();
        info!(
            "Discovering new series added {} to {}",
            range.start, range.end
        );

        let mut found = Vec::new();
        for (n, publisher) in MONITORED_PUBLISHERS.iter().enumerate() {
            if n > 0 {
                self.clock.sleep(self.query_pause).await;
            }
            let hits = self.search_publisher(publisher, range, year).await;
            info!("{}: {} new series", publisher.name, hits.len());
            found.extend(hits);
        }

        if found.len() < FALLBACK_THRESHOLD {
            info!(
                "Only {} candidates from publisher queries, running broad search",
                found.len()
            );
            metrics::DISCOVERY_FALLBACKS.inc();
            self.clock.sleep(self.query_pause).await;
            found.extend(self.search_broad(range, year).await);
        }

        let before = found.len();
        let candidates: Vec<CatalogVolume> = dedupe_by_id(found)
            .into_iter()
            .filter(|v| {
                let keep = is_monitored(v);
                if !keep {
                    debug!("Dropping {} from {}", v.display_name(), v.publisher_name());
                }
                keep
            })
            .collect();

        metrics::DISCOVERY_CANDIDATES.observe(candidates.len() as f64);
        info!(
            "Discovery found {} candidates ({} before dedupe)",
            candidates.len(),
            before
        );
        candidates
    }

    async fn search_publisher(
        &self,
        publisher: &MonitoredPublisher,
        range: DateRange,
        year: i32,
    ) -> Vec<CatalogVolume> {
        let query = VolumeQuery {
            publisher_id: Some(publisher.id),
            date_range: range,
            limit: PER_QUERY_LIMIT,
        };
        match self.catalog.search_volumes(&query).await {
            Ok(volumes) => volumes
                .into_iter()
                .filter(|v| matches_publisher(v, publisher) && is_new_series(v, year))
                .collect(),
            Err(e) => {
                warn!("Catalog search for {} failed: {}", publisher.name, e);
                Vec::new()
            }
        }
    }

    async fn search_broad(&self, range: DateRange, year: i32) -> Vec<CatalogVolume> {
        let query = VolumeQuery {
            publisher_id: None,
            date_range: range,
            limit: PER_QUERY_LIMIT,
        };
        match self.catalog.search_volumes(&query).await {
            Ok(volumes) => volumes
                .into_iter()
                .filter(|v| is_monitored(v) && is_new_series(v, year))
                .collect(),
            Err(e) => {
                warn!("Broad catalog search failed: {}", e);
                Vec::new()
            }
        }
    }
}
