pub mod auth;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod lenient;
pub mod library;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod scheduler;
pub mod testing;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, Authenticator, Caller, Credentials,
    OpenAuthenticator,
};
pub use catalog::{CatalogError, CatalogVolume, ComicCatalog, ComicVineClient};
pub use clock::{Clock, SystemClock};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use library::{HttpLibraryClient, LibraryClient, LibraryError};
pub use monitor::{ComicMonitor, DiscoveryRunResult, RecentAddition, ServiceStatus};
pub use notify::{create_notifier, DownloadNotification, Notifier, NotifyError};
pub use scheduler::{HealthSnapshot, Scheduler, SharedHealth};
