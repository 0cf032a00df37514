use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub library: LibraryConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration for admin commands
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when method = "api_key"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Library service (self-hosted comic manager) connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Base URL, e.g. "http://localhost:5656"
    pub url: String,
    pub api_key: String,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Root folder new volumes are placed in (default: 1)
    #[serde(default = "default_root_folder")]
    pub root_folder_id: u32,
}

/// Catalog service (metadata provider) connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    pub api_key: String,
    #[serde(default = "default_catalog_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

fn default_root_folder() -> u32 {
    1
}

fn default_catalog_url() -> String {
    "https://comicvine.gamespot.com/api".to_string()
}

/// Background jobs and pipeline tunables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Run the periodic new-release discovery job.
    #[serde(default = "default_true")]
    pub discovery_enabled: bool,
    #[serde(default = "default_discovery_interval")]
    pub discovery_interval_hours: u64,
    /// Lookback window for scheduled discovery runs (1-60).
    #[serde(default = "default_days_back")]
    pub days_back: u32,
    #[serde(default = "default_queue_interval")]
    pub queue_poll_interval_secs: u64,
    #[serde(default = "default_health_interval")]
    pub health_check_interval_secs: u64,
    /// Delay before the queue poller starts after boot.
    #[serde(default = "default_startup_delay")]
    pub startup_delay_secs: u64,
    /// Pause after a failed loop iteration.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
    /// Pause between per-publisher catalog queries.
    #[serde(default = "default_publisher_pause")]
    pub publisher_pause_ms: u64,
    /// Pause between successive acquisition candidates.
    #[serde(default = "default_item_pause")]
    pub item_pause_ms: u64,
    /// Pause between a successful add and the automatic source search.
    #[serde(default = "default_search_pause")]
    pub search_pause_ms: u64,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_renotify")]
    pub renotify_minutes: u64,
    /// Trigger a source search right after each successful add.
    #[serde(default = "default_true")]
    pub auto_search: bool,
}

fn default_true() -> bool {
    true
}

fn default_discovery_interval() -> u64 {
    24
}

fn default_days_back() -> u32 {
    7
}

fn default_queue_interval() -> u64 {
    60
}

fn default_health_interval() -> u64 {
    120
}

fn default_startup_delay() -> u64 {
    60
}

fn default_error_backoff() -> u64 {
    30
}

fn default_publisher_pause() -> u64 {
    1000
}

fn default_item_pause() -> u64 {
    2000
}

fn default_search_pause() -> u64 {
    2000
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_renotify() -> u64 {
    30
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            discovery_enabled: true,
            discovery_interval_hours: default_discovery_interval(),
            days_back: default_days_back(),
            queue_poll_interval_secs: default_queue_interval(),
            health_check_interval_secs: default_health_interval(),
            startup_delay_secs: default_startup_delay(),
            error_backoff_secs: default_error_backoff(),
            publisher_pause_ms: default_publisher_pause(),
            item_pause_ms: default_item_pause(),
            search_pause_ms: default_search_pause(),
            cache_ttl_secs: default_cache_ttl(),
            renotify_minutes: default_renotify(),
            auto_search: true,
        }
    }
}

impl MonitorConfig {
    pub fn publisher_pause(&self) -> Duration {
        Duration::from_millis(self.publisher_pause_ms)
    }

    pub fn item_pause(&self) -> Duration {
        Duration::from_millis(self.item_pause_ms)
    }

    pub fn search_pause(&self) -> Duration {
        Duration::from_millis(self.search_pause_ms)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs as i64)
    }

    pub fn renotify_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.renotify_minutes as i64)
    }
}

/// Download notification delivery
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// JSON webhook target. Notifications are only logged when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webhook_url: None,
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub library: SanitizedLibraryConfig,
    pub catalog: SanitizedCatalogConfig,
    pub monitor: MonitorConfig,
    pub notifications: SanitizedNotificationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLibraryConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub root_folder_id: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNotificationConfig {
    pub enabled: bool,
    pub webhook_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
            },
            server: config.server.clone(),
            library: SanitizedLibraryConfig {
                url: config.library.url.clone(),
                api_key_configured: !config.library.api_key.is_empty(),
                timeout_secs: config.library.timeout_secs,
                root_folder_id: config.library.root_folder_id,
            },
            catalog: SanitizedCatalogConfig {
                base_url: config.catalog.base_url.clone(),
                api_key_configured: !config.catalog.api_key.is_empty(),
                timeout_secs: config.catalog.timeout_secs,
            },
            monitor: config.monitor.clone(),
            notifications: SanitizedNotificationConfig {
                enabled: config.notifications.enabled,
                webhook_configured: config.notifications.webhook_url.is_some(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[auth]
method = "none"

[library]
url = "http://localhost:5656"
api_key = "lib-key"

[catalog]
api_key = "cv-key"
"#;

    #[test]
    fn test_deserialize_minimal_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.auth.method, AuthMethod::None);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.library.timeout_secs, 30);
        assert_eq!(config.library.root_folder_id, 1);
        assert_eq!(config.catalog.base_url, "https://comicvine.gamespot.com/api");
        assert!(config.monitor.discovery_enabled);
        assert_eq!(config.monitor.days_back, 7);
        assert_eq!(config.monitor.queue_poll_interval_secs, 60);
        assert_eq!(config.monitor.discovery_interval_hours, 24);
        assert_eq!(config.monitor.renotify_minutes, 30);
        assert!(config.notifications.enabled);
        assert!(config.notifications.webhook_url.is_none());
    }

    #[test]
    fn test_deserialize_missing_library_fails() {
        let toml = r#"
[auth]
method = "none"

[catalog]
api_key = "cv-key"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_monitor_overrides() {
        let toml = format!(
            "{}\n{}",
            MINIMAL,
            r#"
[monitor]
discovery_enabled = false
days_back = 14
item_pause_ms = 0
auto_search = false
"#
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert!(!config.monitor.discovery_enabled);
        assert_eq!(config.monitor.days_back, 14);
        assert_eq!(config.monitor.item_pause(), Duration::ZERO);
        assert!(!config.monitor.auto_search);
        // untouched fields keep defaults
        assert_eq!(config.monitor.publisher_pause_ms, 1000);
    }

    #[test]
    fn test_monitor_durations() {
        let monitor = MonitorConfig::default();
        assert_eq!(monitor.cache_ttl(), chrono::Duration::hours(1));
        assert_eq!(monitor.renotify_window(), chrono::Duration::minutes(30));
        assert_eq!(monitor.search_pause(), Duration::from_secs(2));
    }

    #[test]
    fn test_sanitized_config_hides_keys() {
        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        config.notifications.webhook_url = Some("https://hooks.example/abc".to_string());

        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.auth.method, "none");
        assert!(sanitized.library.api_key_configured);
        assert!(sanitized.catalog.api_key_configured);
        assert!(sanitized.notifications.webhook_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("lib-key"));
        assert!(!json.contains("cv-key"));
        assert!(!json.contains("hooks.example"));
    }
}
