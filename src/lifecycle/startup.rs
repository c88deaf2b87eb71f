//! Startup orchestration.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;

use crate::config::{load_config, watcher::{apply_updates, ConfigWatcher}};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};

/// Options supplied by the command line.
#[derive(Debug, Clone)]
pub struct StartupOptions {
    pub config_path: PathBuf,
    /// Hot-reload the denylist when the config file changes.
    pub watch: bool,
}

/// Load configuration, build the filter host and serve until a signal.
pub async fn run(options: StartupOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&options.config_path)?;
    logging::init(&config.observability.log_level);

    tracing::info!(
        path = ?options.config_path,
        name = %config.name,
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let server = HttpServer::new(config)?;
    let config = server.config();
    tracing::info!(
        filter = %config.name,
        timeout_secs = config.timeouts.request_secs,
        metrics = config.observability.metrics_enabled,
        "Filter host built"
    );

    // Dropping the watcher stops it, so keep it for the server's lifetime.
    let _watcher = if options.watch {
        let (watcher, updates) = ConfigWatcher::new(&options.config_path);
        tokio::spawn(apply_updates(updates, server.denylist()));
        Some(watcher.run()?)
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
