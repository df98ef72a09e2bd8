use gatewatch::config::MonitorConfig;
use gatewatch::monitor::{EndpointRegistry, HealthStore, HttpProber, PollScheduler, QuerySurface};
use gatewatch::server::{create_metrics, run_server, AppState};
use gatewatch::shutdown::{shutdown_channel, supervise, wait_for_signal};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting gatewatch deployment gate monitor");

    let config = match MonitorConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    for url in &config.endpoints {
        info!(url = %url, "Monitoring endpoint");
    }
    if let Some(grafana_url) = &config.grafana_url {
        info!(grafana_url = %grafana_url, "Grafana dashboard configured");
    }

    let registry = EndpointRegistry::new(config.endpoints.clone());
    let store = HealthStore::new(registry.clone());
    let metrics = create_metrics()?;
    let prober = Arc::new(HttpProber::new()?);

    let (shutdown, signal) = shutdown_channel();

    let scheduler = PollScheduler::new(
        registry,
        store.clone(),
        prober,
        metrics.clone(),
        config.check_interval,
        config.probe_timeout,
    );
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown.signal()));
    info!("Background check loop started");

    let state = AppState::new(QuerySurface::new(store), metrics, config.grafana_url.clone());
    let server_handle = tokio::spawn(run_server(config.port, state, signal));

    // Stop on a signal, or early if either task cannot keep running
    supervise(&shutdown, scheduler_handle, server_handle, wait_for_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}
