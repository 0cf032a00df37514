//! Background loops: queue polling, daily discovery, service health.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::MonitorConfig;
use crate::monitor::{ComicMonitor, ServiceStatus};

/// Last observed connectivity, shared with the command surface.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthSnapshot {
    pub services: ServiceStatus,
    pub checked_at: Option<DateTime<Utc>>,
}

pub type SharedHealth = Arc<RwLock<HealthSnapshot>>;

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub discovery_enabled: bool,
    pub tasks: usize,
}

pub struct Scheduler {
    monitor: Arc<ComicMonitor>,
    config: MonitorConfig,
    health: SharedHealth,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(monitor: Arc<ComicMonitor>, config: MonitorConfig, health: SharedHealth) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            monitor,
            config,
            health,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn health(&self) -> SharedHealth {
        Arc::clone(&self.health)
    }

    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return;
        }
        info!("Starting scheduler");

        let mut handles = self.handles.lock().await;
        handles.push(self.spawn_queue_loop());
        if self.config.discovery_enabled {
            handles.push(self.spawn_discovery_loop());
        } else {
            info!("Discovery disabled");
        }
        handles.push(self.spawn_health_loop());
    }

    /// Signal every loop and wait for them to finish.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Scheduler not running");
            return;
        }
        info!("Stopping scheduler");
        let _ = self.shutdown_tx.send(());

        let handles: Vec<JoinHandle<()>> = self.handles.lock().await.drain(..).collect();
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                error!("Scheduler task ended abnormally: {}", e);
            }
        }
        info!("Scheduler stopped");
    }

    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.running.load(Ordering::Relaxed),
            discovery_enabled: self.config.discovery_enabled,
            tasks: self.handles.lock().await.len(),
        }
    }

    fn spawn_queue_loop(&self) -> JoinHandle<()> {
        let monitor = Arc::clone(&self.monitor);
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Queue loop started");
            let clock = Arc::clone(monitor.clock());
            let backoff = Duration::from_secs(config.error_backoff_secs);

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Queue loop received shutdown signal");
                    return;
                }
                _ = async {
                    clock.sleep(Duration::from_secs(config.startup_delay_secs)).await;
                    while !monitor.library().check_connection().await {
                        warn!("Library not ready, retrying in {:?}", backoff);
                        clock.sleep(backoff).await;
                    }
                } => {}
            }
            info!("Library ready, polling queue");

            loop {
                let pause = match monitor.poll_queue().await {
                    Ok(_) => Duration::from_secs(config.queue_poll_interval_secs),
                    Err(e) => {
                        warn!("Queue poll failed: {}", e);
                        backoff
                    }
                };
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Queue loop received shutdown signal");
                        break;
                    }
                    _ = clock.sleep(pause) => {}
                }
            }
            info!("Queue loop stopped");
        })
    }

    fn spawn_discovery_loop(&self) -> JoinHandle<()> {
        let monitor = Arc::clone(&self.monitor);
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Discovery loop started");
            let clock = Arc::clone(monitor.clock());
            let interval =
                Duration::from_secs(config.discovery_interval_hours.saturating_mul(3600));

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Discovery loop received shutdown signal");
                        break;
                    }
                    _ = async {
                        let services = monitor.check_services().await;
                        if services.all_up() {
                            let result = monitor.check_and_add_new_comics(config.days_back).await;
                            info!("Scheduled discovery: {}", result.summary());
                        } else {
                            warn!(
                                "Skipping discovery, services down (library: {}, catalog: {})",
                                services.library, services.catalog
                            );
                        }
                        clock.sleep(interval).await;
                    } => {}
                }
            }
            info!("Discovery loop stopped");
        })
    }

    fn spawn_health_loop(&self) -> JoinHandle<()> {
        let monitor = Arc::clone(&self.monitor);
        let health = Arc::clone(&self.health);
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Health loop started");
            let clock = Arc::clone(monitor.clock());
            let interval = Duration::from_secs(config.health_check_interval_secs);

            loop {
                let services = monitor.check_services().await;
                if !services.library {
                    warn!("Library unreachable");
                }
                if !services.catalog {
                    warn!("Catalog unreachable");
                }
                *health.write().await = HealthSnapshot {
                    services,
                    checked_at: Some(clock.now()),
                };

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Health loop received shutdown signal");
                        break;
                    }
                    _ = clock.sleep(interval) => {}
                }
            }
            info!("Health loop stopped");
        })
    }
}
