//! Scheduler integration tests.
//!
//! The mock clock makes every interval elapse instantly, so the loops spin
//! as fast as the runtime lets them; tests wait on observable side effects.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use longbox_core::config::MonitorConfig;
use longbox_core::testing::{fixtures, MockCatalog, MockClock, MockLibrary, MockNotifier};
use longbox_core::{ComicMonitor, Config, HealthSnapshot, Scheduler};
use tokio::sync::RwLock;

struct TestHarness {
    catalog: Arc<MockCatalog>,
    library: Arc<MockLibrary>,
    notifier: Arc<MockNotifier>,
    scheduler: Scheduler,
}

impl TestHarness {
    fn new(monitor_config: MonitorConfig) -> Self {
        let config = Config {
            monitor: monitor_config.clone(),
            ..fixtures::config()
        };
        let catalog = Arc::new(MockCatalog::new());
        let library = Arc::new(MockLibrary::new());
        let notifier = Arc::new(MockNotifier::new());
        let monitor = Arc::new(ComicMonitor::new(
            catalog.clone(),
            library.clone(),
            notifier.clone(),
            Arc::new(MockClock::default()),
            &config,
        ));
        let scheduler = Scheduler::new(
            monitor,
            monitor_config,
            Arc::new(RwLock::new(HealthSnapshot::default())),
        );
        Self {
            catalog,
            library,
            notifier,
            scheduler,
        }
    }
}

async fn wait_until<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..400 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

fn fast_config() -> MonitorConfig {
    fixtures::config().monitor
}

#[tokio::test]
async fn test_queue_loop_polls_and_notifies() {
    let h = TestHarness::new(MonitorConfig {
        discovery_enabled: false,
        ..fast_config()
    });
    h.library
        .insert_volume(fixtures::library_volume(7, 4050, "Venom"))
        .await;
    h.library
        .set_queue(vec![fixtures::queue_item(1, 7, "completed", 100.0)])
        .await;

    h.scheduler.start().await;
    assert!(wait_until(|| async { h.library.call_count("queue").await >= 3 }).await);
    h.scheduler.stop().await;

    // polled many times, announced once
    assert_eq!(h.notifier.sent().await.len(), 1);
    assert!(h.catalog.queries().await.is_empty());
    assert!(!h.scheduler.status().await.running);
}

#[tokio::test]
async fn test_discovery_loop_adds_new_series() {
    let h = TestHarness::new(fast_config());
    h.catalog
        .set_publisher_results(31, vec![fixtures::marvel_volume(11, "Venom")])
        .await;

    h.scheduler.start().await;
    assert!(wait_until(|| async { h.library.volume_count().await == 1 }).await);
    h.scheduler.stop().await;

    let added = h.library.added_volumes().await;
    assert_eq!(added[0].catalog_id, 11);
    // later runs find it already present
    assert_eq!(h.library.volume_count().await, 1);
}

#[tokio::test]
async fn test_discovery_skipped_while_catalog_down() {
    let h = TestHarness::new(fast_config());
    h.catalog.set_connected(false).await;

    h.scheduler.start().await;
    let health = h.scheduler.health();
    assert!(wait_until(|| async { health.read().await.checked_at.is_some() }).await);
    h.scheduler.stop().await;

    let snapshot = health.read().await.clone();
    assert!(snapshot.services.library);
    assert!(!snapshot.services.catalog);
    assert!(h.catalog.queries().await.is_empty());
}

#[tokio::test]
async fn test_queue_failures_do_not_end_loop() {
    let h = TestHarness::new(MonitorConfig {
        discovery_enabled: false,
        ..fast_config()
    });

    h.scheduler.start().await;
    assert!(wait_until(|| async { h.library.call_count("queue").await >= 1 }).await);
    h.library
        .set_next_error(longbox_core::LibraryError::Connection("gone".into()))
        .await;
    let before = h.library.call_count("queue").await;
    assert!(wait_until(|| async { h.library.call_count("queue").await > before + 2 }).await);
    h.scheduler.stop().await;
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let h = TestHarness::new(fast_config());
    h.scheduler.start().await;
    h.scheduler.start().await;
    assert_eq!(h.scheduler.status().await.tasks, 3);

    h.scheduler.stop().await;
    h.scheduler.stop().await;
    let status = h.scheduler.status().await;
    assert!(!status.running);
    assert_eq!(status.tasks, 0);
}
