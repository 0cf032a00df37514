use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use longbox_core::{
    create_authenticator, create_notifier, load_config, validate_config, Authenticator,
    ComicCatalog, ComicMonitor, ComicVineClient, HttpLibraryClient, LibraryClient, Scheduler,
    SharedHealth, SystemClock,
};
use longbox_server::api::create_router;
use longbox_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting longbox v{}", VERSION);

    // Determine config path
    let config_path = std::env::var("LONGBOX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Library: {}", config.library.url);

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Upstream services
    let library: Arc<dyn LibraryClient> = Arc::new(
        HttpLibraryClient::new(&config.library).context("Failed to create library client")?,
    );
    let catalog: Arc<dyn ComicCatalog> = Arc::new(
        ComicVineClient::new(&config.catalog).context("Failed to create catalog client")?,
    );
    let notifier =
        create_notifier(&config.notifications).context("Failed to create notifier")?;
    if config.notifications.enabled {
        info!("Download notifications via {}", notifier.name());
    } else {
        info!("Download notifications disabled");
    }

    let monitor = Arc::new(ComicMonitor::new(
        catalog,
        library,
        notifier,
        Arc::new(SystemClock),
        &config,
    ));

    // Background loops
    let health = SharedHealth::default();
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&monitor),
        config.monitor.clone(),
        Arc::clone(&health),
    ));
    scheduler.start().await;

    let addr = SocketAddr::new(config.server.host, config.server.port);

    let state = Arc::new(AppState::new(
        config,
        authenticator,
        monitor,
        health,
        Some(Arc::clone(&scheduler)),
    ));
    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped, stopping background loops...");
    scheduler.stop().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
