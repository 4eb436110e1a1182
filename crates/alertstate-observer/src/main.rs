//! Host process for the alert instance state cache.
//!
//! Loads `alertstate-config.yaml`, builds one [`StateCache`], installs the
//! Prometheus recorder, starts the periodic metrics recorder, and serves the
//! Observer API until `Ctrl-C`.

use std::path::Path;
use std::sync::Arc;

use alertstate_cache::metrics::register_metrics;
use alertstate_cache::{
    CacheConfig, ConfigError, MiniJinjaResolver, PrometheusSink, StateCache,
    spawn_metrics_recorder,
};
use alertstate_observer::{AppState, start_server};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Configuration file looked up in the working directory.
const CONFIG_FILE: &str = "alertstate-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("alertstate-observer starting");

    let config = load_config()?;
    info!(
        external_url = ?config.external_url,
        metrics_interval_ms = config.metrics_interval_ms,
        host = %config.observer.host,
        port = config.observer.port,
        "configuration loaded"
    );

    let prometheus = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            register_metrics();
            Some(handle)
        }
        Err(e) => {
            warn!(error = %e, "failed to install Prometheus recorder, /metrics disabled");
            None
        }
    };

    let cache = Arc::new(StateCache::new(
        Arc::new(MiniJinjaResolver::new()),
        Arc::new(PrometheusSink),
        config.template_base_url(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let recorder = spawn_metrics_recorder(
        Arc::clone(&cache),
        config.metrics_interval(),
        shutdown_rx,
    );

    let mut app_state = AppState::new(Arc::clone(&cache));
    if let Some(handle) = prometheus {
        app_state = app_state.with_prometheus(handle);
    }

    start_server(&config.observer, Arc::new(app_state), async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
    })
    .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = recorder.await {
        warn!(error = %e, "metrics recorder task failed");
    }

    info!("alertstate-observer shutdown complete");
    Ok(())
}

/// Load configuration from [`CONFIG_FILE`], falling back to defaults.
fn load_config() -> Result<CacheConfig, ConfigError> {
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        CacheConfig::from_file(path)
    } else {
        info!("Config file not found, using defaults");
        CacheConfig::parse("")
    }
}
