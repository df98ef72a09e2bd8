//! HTML control panel served at `/`
//!
//! Rendered from `templates/dashboard.html`; askama HTML-escapes every
//! interpolated value.

use crate::monitor::{EndpointStatus, StatusResponse};
use askama::Template;

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate<'a> {
    gate_class: &'static str,
    gate_label: &'static str,
    last_check: String,
    tick: u64,
    rows: Vec<EndpointRow<'a>>,
    grafana_url: Option<&'a str>,
}

/// One line of the endpoint table
struct EndpointRow<'a> {
    url: &'a str,
    class: &'static str,
    label: &'static str,
    latency: String,
    detail: String,
}

impl<'a> From<&'a EndpointStatus> for EndpointRow<'a> {
    fn from(endpoint: &'a EndpointStatus) -> Self {
        let (class, label) = match (endpoint.up, endpoint.checked_at) {
            (true, _) => ("ok", "UP"),
            (false, Some(_)) => ("bad", "DOWN"),
            (false, None) => ("meta", "PENDING"),
        };

        Self {
            url: &endpoint.url,
            class,
            label,
            latency: endpoint
                .latency_seconds
                .map(|s| format!("{:.0} ms", s * 1000.0))
                .unwrap_or_else(|| "-".to_string()),
            detail: endpoint
                .failure
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}

/// Render the dashboard for one status view
pub fn render_dashboard(
    status: &StatusResponse,
    grafana_url: Option<&str>,
) -> Result<String, askama::Error> {
    let (gate_class, gate_label) = if status.can_deploy {
        ("ok", "OPEN (can deploy)")
    } else {
        ("bad", "CLOSED (do not deploy)")
    };

    DashboardTemplate {
        gate_class,
        gate_label,
        last_check: status
            .last_check
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "n/a".to_string()),
        tick: status.tick,
        rows: status.endpoints.iter().map(EndpointRow::from).collect(),
        grafana_url,
    }
    .render()
}
