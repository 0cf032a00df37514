use std::sync::Arc;

use longbox_core::{
    Authenticator, ComicMonitor, Config, LibraryClient, SanitizedConfig, Scheduler, SharedHealth,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    monitor: Arc<ComicMonitor>,
    health: SharedHealth,
    /// Absent when the background loops are not running (tests, one-shot tools).
    scheduler: Option<Arc<Scheduler>>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        monitor: Arc<ComicMonitor>,
        health: SharedHealth,
        scheduler: Option<Arc<Scheduler>>,
    ) -> Self {
        Self {
            config,
            authenticator,
            monitor,
            health,
            scheduler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn monitor(&self) -> &Arc<ComicMonitor> {
        &self.monitor
    }

    pub fn library(&self) -> &Arc<dyn LibraryClient> {
        self.monitor.library()
    }

    pub fn health(&self) -> &SharedHealth {
        &self.health
    }

    pub fn scheduler(&self) -> Option<&Arc<Scheduler>> {
        self.scheduler.as_ref()
    }
}
