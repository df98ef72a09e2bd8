//! Tests for monitor metrics

use super::metrics::{create_metrics, MonitorMetrics};
use crate::monitor::{
    EndpointRegistry, EndpointResult, HealthSnapshot, ProbeFailure, TickRecorder,
};
use std::time::Duration;

const A: &str = "http://a.test/";
const B: &str = "http://b.test/";
const C: &str = "http://c.test/";

fn snapshot(tick: u64, results: Vec<EndpointResult>) -> HealthSnapshot {
    HealthSnapshot::from_results(tick, EndpointRegistry::new([A, B, C]), results)
}

fn mixed_snapshot() -> HealthSnapshot {
    snapshot(
        1,
        vec![
            EndpointResult::healthy(A, Duration::from_millis(50)),
            EndpointResult::healthy(B, Duration::from_millis(50)),
            EndpointResult::failed(C, Duration::from_secs(5), ProbeFailure::Timeout),
        ],
    )
}

#[test]
fn test_metrics_creation() {
    let metrics = MonitorMetrics::new().expect("should create metrics");
    let snapshot = mixed_snapshot();
    metrics.record_tick(&snapshot);

    let output = metrics.render(&snapshot).expect("should encode metrics");

    assert!(output.contains("endpoint_up"));
    assert!(output.contains("endpoint_last_latency_seconds"));
    assert!(output.contains("endpoint_latency_seconds"));
    assert!(output.contains("monitor_can_deploy"));
    assert!(output.contains("monitor_last_check_timestamp_seconds"));
    assert!(output.contains("monitor_ticks_total"));
}

#[test]
fn test_render_reflects_snapshot() {
    let metrics = MonitorMetrics::new().expect("should create metrics");

    let output = metrics.render(&mixed_snapshot()).expect("should encode metrics");

    assert!(output.contains("endpoint_up{url=\"http://a.test/\"} 1"));
    assert!(output.contains("endpoint_up{url=\"http://b.test/\"} 1"));
    assert!(output.contains("endpoint_up{url=\"http://c.test/\"} 0"));
    assert!(output.contains("endpoint_last_latency_seconds{url=\"http://c.test/\"} 5"));
    assert!(output.contains("monitor_can_deploy 0"));
}

#[test]
fn test_render_before_first_tick_is_fail_closed() {
    let metrics = MonitorMetrics::new().expect("should create metrics");
    let initial = HealthSnapshot::initial(EndpointRegistry::new([A, B]));

    let output = metrics.render(&initial).expect("should encode metrics");

    assert!(output.contains("endpoint_up{url=\"http://a.test/\"} 0"));
    assert!(output.contains("endpoint_up{url=\"http://b.test/\"} 0"));
    assert!(output.contains("monitor_can_deploy 0"));
    assert!(output.contains("monitor_last_check_timestamp_seconds 0"));
}

#[test]
fn test_render_recovery_updates_gauges() {
    let metrics = MonitorMetrics::new().expect("should create metrics");
    metrics.render(&mixed_snapshot()).expect("first render");

    let healthy = snapshot(
        2,
        vec![
            EndpointResult::healthy(A, Duration::from_millis(40)),
            EndpointResult::healthy(B, Duration::from_millis(40)),
            EndpointResult::healthy(C, Duration::from_millis(40)),
        ],
    );
    let output = metrics.render(&healthy).expect("second render");

    assert!(output.contains("endpoint_up{url=\"http://c.test/\"} 1"));
    assert!(output.contains("monitor_can_deploy 1"));
}

#[test]
fn test_record_tick_counts_observations() {
    let metrics = MonitorMetrics::new().expect("should create metrics");
    let snapshot = mixed_snapshot();

    metrics.record_tick(&snapshot);
    metrics.record_tick(&snapshot);

    let output = metrics.render(&snapshot).expect("should encode metrics");
    assert!(output.contains("monitor_ticks_total 2"));
    assert!(output.contains("endpoint_latency_seconds_count{url=\"http://c.test/\"} 2"));
}

#[test]
fn test_histogram_buckets() {
    let metrics = MonitorMetrics::new().expect("should create metrics");
    let snapshot = mixed_snapshot();
    metrics.record_tick(&snapshot);

    let output = metrics.render(&snapshot).expect("should encode metrics");

    assert!(output.contains("endpoint_latency_seconds_bucket{url=\"http://a.test/\",le=\"0.05\"} 1"));
    assert!(output.contains("endpoint_latency_seconds_bucket{url=\"http://c.test/\",le=\"2.5\"} 0"));
    assert!(output.contains("endpoint_latency_seconds_bucket{url=\"http://c.test/\",le=\"5\"} 1"));
    assert!(output.contains("endpoint_latency_seconds_bucket{url=\"http://c.test/\",le=\"+Inf\"} 1"));
    assert!(output.contains("endpoint_latency_seconds_sum{url=\"http://c.test/\"} 5"));
}

#[test]
fn test_create_shared_metrics() {
    let metrics = create_metrics().expect("should create shared metrics");

    // Verify Arc sharing works
    let metrics2 = metrics.clone();
    metrics.record_tick(&mixed_snapshot());

    assert_eq!(metrics2.ticks_total.get(), 1);
}
