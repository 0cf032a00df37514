//! Testing utilities and mock implementations.
//!
//! Mocks for every external seam (library, catalog, clock, notifier) so the
//! monitor and the HTTP surface can be exercised without real services.
//!
//! # Example
//!
//! ```rust,ignore
//! use longbox_core::testing::{fixtures, MockCatalog, MockLibrary};
//!
//! let catalog = MockCatalog::new();
//! catalog.set_publisher_results(31, vec![fixtures::marvel_volume(1, "Venom")]).await;
//!
//! let library = MockLibrary::new();
//! library.insert_volume(fixtures::library_volume(7, 4050, "Storm")).await;
//! ```

mod mock_catalog;
mod mock_clock;
mod mock_library;
mod mock_notifier;

pub use mock_catalog::MockCatalog;
pub use mock_clock::MockClock;
pub use mock_library::{MockLibrary, RecordedDownload};
pub use mock_notifier::MockNotifier;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::net::{IpAddr, Ipv4Addr};

    use crate::catalog::{CatalogPublisher, CatalogVolume};
    use crate::config::{
        AuthConfig, AuthMethod, CatalogConfig, Config, LibraryConfig, MonitorConfig,
        NotificationConfig, ServerConfig,
    };
    use crate::library::{
        CatalogId, DownloadOption, LibrarySearchResult, LibraryVolume, QueueItem,
    };
    use crate::notify::{DownloadNotification, NotificationKind};

    /// Catalog volume with a structured publisher. A publisher id of 0 means
    /// the record carried only a name.
    pub fn catalog_volume(
        id: u64,
        name: &str,
        publisher: Option<(u64, &str)>,
        start_year: Option<i64>,
    ) -> CatalogVolume {
        CatalogVolume {
            id,
            name: name.to_string(),
            publisher: publisher.map(|(pid, pname)| CatalogPublisher {
                id: (pid > 0).then_some(pid),
                name: pname.to_string(),
            }),
            start_year,
            issue_count: 1,
            description: String::new(),
            deck: String::new(),
            image: None,
        }
    }

    /// Catalog volume whose publisher is only a name.
    pub fn catalog_volume_flat(id: u64, name: &str, publisher: &str) -> CatalogVolume {
        catalog_volume(id, name, Some((0, publisher)), Some(2026))
    }

    /// A brand-new Marvel series.
    pub fn marvel_volume(id: u64, name: &str) -> CatalogVolume {
        catalog_volume(id, name, Some((31, "Marvel")), Some(2026))
    }

    pub fn library_volume(id: u64, catalog_id: u64, title: &str) -> LibraryVolume {
        LibraryVolume {
            id,
            comicvine_id: Some(CatalogId::Numeric(catalog_id)),
            title: title.to_string(),
            year: Some(2026),
            publisher: "Marvel".to_string(),
            issue_count: 6,
            issues_downloaded: 2,
            monitored: true,
            description: String::new(),
        }
    }

    pub fn library_search_result(catalog_id: u64, title: &str) -> LibrarySearchResult {
        LibrarySearchResult {
            comicvine_id: Some(CatalogId::Numeric(catalog_id)),
            title: title.to_string(),
            year: Some(2026),
            publisher: "Marvel".to_string(),
            issue_count: 6,
            description: String::new(),
            cover_link: String::new(),
            already_added: None,
        }
    }

    pub fn download_option(title: &str, link: &str, is_match: bool) -> DownloadOption {
        DownloadOption {
            link: link.to_string(),
            display_title: title.to_string(),
            title: title.to_string(),
            source: "GetComics".to_string(),
            is_match,
            match_issue: None,
            series: None,
            volume_number: Some(1),
            filesize: 50 * 1024 * 1024,
        }
    }

    pub fn queue_item(download_id: u64, volume_id: u64, status: &str, progress: f64) -> QueueItem {
        QueueItem {
            id: Some(download_id),
            volume_id: Some(volume_id),
            status: status.to_string(),
            progress,
            size: 50 * 1024 * 1024,
            speed: 512.0 * 1024.0,
            source_name: "GetComics".to_string(),
            source_type: "direct".to_string(),
            title: "Venom 001".to_string(),
            web_title: Some("Venom #1 (2026)".to_string()),
            web_sub_title: String::new(),
            web_link: "https://getcomics.org/venom-1".to_string(),
            file: "/downloads/Venom 001.cbz".to_string(),
        }
    }

    pub fn download_notification(download_id: u64, volume_id: u64, status: &str) -> DownloadNotification {
        DownloadNotification {
            kind: NotificationKind::Other,
            status: status.to_string(),
            download_id,
            volume_id,
            volume_title: "Volume".to_string(),
            volume_year: None,
            publisher: "Marvel".to_string(),
            monitored: true,
            issues_downloaded: 0,
            issue_count: 0,
            release_title: "Release".to_string(),
            release_subtitle: None,
            source_name: "GetComics".to_string(),
            source_type: "direct".to_string(),
            size_bytes: None,
            progress: None,
            speed: None,
            file_name: None,
            catalog_url: None,
            source_link: None,
            cover_url: None,
        }
    }

    /// Valid configuration with every pause set to zero.
    pub fn config() -> Config {
        Config {
            auth: AuthConfig {
                method: AuthMethod::None,
                api_key: None,
            },
            server: ServerConfig {
                host: IpAddr::V4(Ipv4Addr::LOCALHOST),
                port: 8080,
            },
            library: LibraryConfig {
                url: "http://localhost:5656".to_string(),
                api_key: "library-key".to_string(),
                timeout_secs: 30,
                root_folder_id: 1,
            },
            catalog: CatalogConfig {
                api_key: "catalog-key".to_string(),
                base_url: "https://comicvine.gamespot.com/api".to_string(),
                timeout_secs: 30,
            },
            monitor: MonitorConfig {
                publisher_pause_ms: 0,
                item_pause_ms: 0,
                search_pause_ms: 0,
                startup_delay_secs: 0,
                ..MonitorConfig::default()
            },
            notifications: NotificationConfig::default(),
        }
    }
}
