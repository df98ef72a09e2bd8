//! Tests for the HTML dashboard

use super::dashboard::render_dashboard;
use crate::monitor::{EndpointStatus, ProbeFailure, StatusResponse};
use chrono::{TimeZone, Utc};

fn status(can_deploy: bool, endpoints: Vec<EndpointStatus>) -> StatusResponse {
    StatusResponse {
        can_deploy,
        tick: 7,
        last_check: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).single(),
        endpoints,
    }
}

fn render(status: &StatusResponse, grafana_url: Option<&str>) -> String {
    render_dashboard(status, grafana_url).expect("dashboard renders")
}

fn endpoint(url: &str, up: bool, failure: Option<ProbeFailure>) -> EndpointStatus {
    EndpointStatus {
        url: url.to_string(),
        up,
        latency_seconds: Some(0.125),
        checked_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).single(),
        failure,
    }
}

#[test]
fn test_open_gate() {
    let html = render(&status(true, vec![endpoint("http://a.test/", true, None)]), None);

    assert!(html.contains("OPEN (can deploy)"));
    assert!(html.contains("class=\"ok\""));
    assert!(html.contains("2026-03-01 12:30:00 UTC"));
    assert!(html.contains("round 7"));
    assert!(html.contains("125 ms"));
    assert!(!html.contains("<iframe"), "no Grafana panel unless configured");
}

#[test]
fn test_closed_gate_shows_failure_detail() {
    let html = render(
        &status(
            false,
            vec![endpoint("http://b.test/", false, Some(ProbeFailure::Status(503)))],
        ),
        None,
    );

    assert!(html.contains("CLOSED (do not deploy)"));
    assert!(html.contains("DOWN"));
    assert!(html.contains("non-success status 503"));
}

#[test]
fn test_pending_before_first_tick() {
    let mut pending = endpoint("http://a.test/", false, None);
    pending.latency_seconds = None;
    pending.checked_at = None;
    let mut view = status(false, vec![pending]);
    view.last_check = None;
    view.tick = 0;

    let html = render(&view, None);

    assert!(html.contains("PENDING"));
    assert!(html.contains("Last check: n/a"));
}

#[test]
fn test_grafana_embedded_and_escaped() {
    let html = render(
        &status(true, Vec::new()),
        Some("http://grafana.test/d/x?orgId=1&kiosk"),
    );

    assert!(html.contains("<iframe src=\"http://grafana.test/d/x?orgId=1&amp;kiosk\""));
}

#[test]
fn test_dynamic_text_is_escaped() {
    let html = render(
        &status(
            false,
            vec![endpoint(
                "http://x.test/?q=<script>",
                false,
                Some(ProbeFailure::Request("\"bad\" & <worse>".to_string())),
            )],
        ),
        None,
    );

    assert!(!html.contains("<script>"));
    assert!(html.contains("http://x.test/?q=&lt;script&gt;"));
    assert!(html.contains("&quot;bad&quot; &amp; &lt;worse&gt;"));
}

#[test]
fn test_grafana_url_cannot_break_out_of_attribute() {
    let html = render(
        &status(true, Vec::new()),
        Some("http://grafana.test/\" onload=\"alert(1)"),
    );

    assert!(!html.contains("\" onload=\""));
    assert!(html.contains("&quot; onload=&quot;alert(1)"));
}

#[test]
fn test_single_quotes_are_escaped() {
    let html = render(
        &status(
            false,
            vec![endpoint(
                "http://x.test/?q=' onmouseover='x",
                false,
                Some(ProbeFailure::Connect("it's down".to_string())),
            )],
        ),
        None,
    );

    assert!(!html.contains("' onmouseover='"));
    assert!(!html.contains("it's down"));
}

#[test]
fn test_every_endpoint_gets_a_row() {
    let html = render(
        &status(
            false,
            vec![
                endpoint("http://a.test/", true, None),
                endpoint("http://b.test/", false, Some(ProbeFailure::Timeout)),
            ],
        ),
        None,
    );

    assert_eq!(html.matches("<tr><td>").count(), 2);
    assert!(html.contains("<td>http://a.test/</td><td class=\"ok\">UP</td>"));
    assert!(html.contains("<td>http://b.test/</td><td class=\"bad\">DOWN</td>"));
}
