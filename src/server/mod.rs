//! HTTP surface for the monitor
//!
//! - `/` - HTML dashboard
//! - `/api/gate` - deployment gate flag for CI/CD pipelines
//! - `/api/status` - per-endpoint status as JSON
//! - `/metrics` - Prometheus scrape endpoint
//! - `/healthz`, `/readyz` - liveness and readiness probes

mod api;
mod dashboard;
pub mod metrics;

pub use api::{router, run_server, AppState};
pub use dashboard::render_dashboard;
pub use metrics::{create_metrics, MonitorMetrics, SharedMetrics};

#[cfg(test)]
#[path = "api_test.rs"]
mod api_tests;

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_tests;

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_tests;
