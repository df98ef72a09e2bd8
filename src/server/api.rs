//! HTTP routes backed by the query surface
//!
//! Handlers only read the currently published snapshot. None of them can
//! trigger or wait on a probe.

use crate::monitor::{GateResponse, QuerySurface, StatusResponse};
use crate::server::dashboard::render_dashboard;
use crate::server::metrics::SharedMetrics;
use crate::shutdown::ShutdownSignal;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub query: QuerySurface,
    pub metrics: SharedMetrics,
    pub grafana_url: Option<Arc<str>>,
}

impl AppState {
    pub fn new(query: QuerySurface, metrics: SharedMetrics, grafana_url: Option<String>) -> Self {
        Self {
            query,
            metrics,
            grafana_url: grafana_url.map(Into::into),
        }
    }
}

/// Liveness probe handler
///
/// Always returns 200 OK - if this responds, the process is alive.
async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe handler
///
/// Returns 200 OK once the first tick has been committed, 503 before.
async fn readyz(State(state): State<AppState>) -> StatusCode {
    if state.query.has_checked() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Deployment gate handler
///
/// Always 200 with a boolean; an unhealthy system reports `false`, not an error.
async fn gate(State(state): State<AppState>) -> Json<GateResponse> {
    Json(state.query.gate())
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.query.status())
}

async fn dashboard(State(state): State<AppState>) -> Response {
    let status = state.query.status();
    match render_dashboard(&status, state.grafana_url.as_deref()) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render dashboard");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render dashboard: {}", e),
            )
                .into_response()
        }
    }
}

/// Metrics handler
///
/// Returns metrics in Prometheus text format, rendered from the same
/// snapshot the gate currently reports.
async fn metrics(State(state): State<AppState>) -> Response {
    let snapshot = state.query.snapshot();
    match state.metrics.render(&snapshot) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

/// Build the router for all monitor endpoints
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/gate", get(gate))
        .route("/api/status", get(status))
        .route("/metrics", get(metrics))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state)
}

/// Run the HTTP server on the specified port
///
/// # Arguments
/// * `port` - The port to listen on
/// * `state` - Query surface, metrics and dashboard settings
/// * `shutdown` - Stops accepting connections once signalled
///
/// # Returns
/// Runs until shutdown is signalled, or fails if the port cannot be bound
pub async fn run_server(
    port: u16,
    state: AppState,
    mut shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    // Log after successful bind - server is actually listening
    info!(port = %port, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
}
