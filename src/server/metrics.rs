//! Prometheus metrics for the monitor
//!
//! Two kinds of series live here:
//! - Snapshot gauges (`endpoint_up`, `endpoint_last_latency_seconds`,
//!   `monitor_can_deploy`, `monitor_last_check_timestamp_seconds`), rewritten
//!   from a single snapshot on every scrape so `/metrics` and `/api/gate`
//!   always agree
//! - Cumulative series (`endpoint_latency_seconds`, `monitor_ticks_total`),
//!   recorded once per committed tick

use crate::monitor::{HealthSnapshot, TickRecorder};
use prometheus::{
    self, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntGauge,
    IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::sync::{Arc, Mutex};

/// Monitor metrics registry
///
/// Thread-safe container for all Prometheus metrics.
pub struct MonitorMetrics {
    registry: Registry,
    /// Serializes snapshot-to-gauge rendering so concurrent scrapes never
    /// interleave two snapshots in one output
    render_lock: Mutex<()>,
    /// 1 if the endpoint's last check returned 2xx within the timeout
    pub endpoint_up: IntGaugeVec,
    /// Latency of the endpoint's last check in seconds
    pub endpoint_last_latency_seconds: GaugeVec,
    /// Distribution of check latencies in seconds
    pub endpoint_latency_seconds: HistogramVec,
    /// Deployment gate flag (1 = can deploy)
    pub can_deploy: IntGauge,
    /// Unix time the current snapshot was committed (0 before the first tick)
    pub last_check_timestamp_seconds: Gauge,
    /// Committed ticks
    pub ticks_total: IntCounter,
}

impl MonitorMetrics {
    /// Create a new metrics registry with all monitor metrics
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let endpoint_up = IntGaugeVec::new(
            Opts::new("endpoint_up", "1 if endpoint is up (2xx), else 0"),
            &["url"],
        )?;
        registry.register(Box::new(endpoint_up.clone()))?;

        let endpoint_last_latency_seconds = GaugeVec::new(
            Opts::new(
                "endpoint_last_latency_seconds",
                "Latency of the most recent check in seconds",
            ),
            &["url"],
        )?;
        registry.register(Box::new(endpoint_last_latency_seconds.clone()))?;

        let endpoint_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "endpoint_latency_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["url"],
        )?;
        registry.register(Box::new(endpoint_latency_seconds.clone()))?;

        let can_deploy = IntGauge::new(
            "monitor_can_deploy",
            "Deployment gate flag (1 = can deploy, 0 = do not deploy)",
        )?;
        registry.register(Box::new(can_deploy.clone()))?;

        let last_check_timestamp_seconds = Gauge::new(
            "monitor_last_check_timestamp_seconds",
            "Unix time of the most recent committed check round",
        )?;
        registry.register(Box::new(last_check_timestamp_seconds.clone()))?;

        let ticks_total = IntCounter::new("monitor_ticks_total", "Committed check rounds")?;
        registry.register(Box::new(ticks_total.clone()))?;

        Ok(Self {
            registry,
            render_lock: Mutex::new(()),
            endpoint_up,
            endpoint_last_latency_seconds,
            endpoint_latency_seconds,
            can_deploy,
            last_check_timestamp_seconds,
            ticks_total,
        })
    }

    /// Rewrite the snapshot gauges from `snapshot` and encode everything
    ///
    /// Registered URLs without a result are exported as down.
    pub fn render(&self, snapshot: &HealthSnapshot) -> Result<String, prometheus::Error> {
        let _guard = self
            .render_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for url in snapshot.registry().iter() {
            let result = snapshot.result(url);
            let up = result.is_some_and(|r| r.up);
            self.endpoint_up
                .with_label_values(&[url])
                .set(i64::from(up));
            if let Some(result) = result {
                self.endpoint_last_latency_seconds
                    .with_label_values(&[url])
                    .set(result.latency_seconds);
            }
        }

        self.can_deploy.set(i64::from(snapshot.can_deploy()));
        self.last_check_timestamp_seconds.set(
            snapshot
                .completed_at()
                .map(|t| t.timestamp_millis() as f64 / 1000.0)
                .unwrap_or(0.0),
        );

        self.encode()
    }

    /// Encode all metrics to Prometheus text format
    fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Failed to encode metrics as UTF-8: {}", e))
        })
    }
}

impl TickRecorder for MonitorMetrics {
    /// Record the cumulative series for a freshly committed snapshot
    fn record_tick(&self, snapshot: &HealthSnapshot) {
        for result in snapshot.results() {
            self.endpoint_latency_seconds
                .with_label_values(&[result.url.as_str()])
                .observe(result.latency_seconds);
        }
        self.ticks_total.inc();
    }
}

/// Shared metrics handle for the scheduler and the HTTP layer
pub type SharedMetrics = Arc<MonitorMetrics>;

/// Create a new shared metrics instance
pub fn create_metrics() -> Result<SharedMetrics, prometheus::Error> {
    Ok(Arc::new(MonitorMetrics::new()?))
}
