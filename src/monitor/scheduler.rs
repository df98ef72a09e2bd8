//! Poll scheduler
//!
//! Runs for the lifetime of the process. Each tick probes every registered
//! URL concurrently, waits for all of them, then publishes one new snapshot.
//! A tick is never committed partially, and nothing a probe does can stop
//! the loop.

use crate::monitor::prober::{Probe, ProbeFailure};
use crate::monitor::registry::EndpointRegistry;
use crate::monitor::store::{EndpointResult, HealthSnapshot, HealthStore};
use crate::shutdown::ShutdownSignal;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Extra time a probe task gets beyond its own timeout before the scheduler
/// abandons it
pub const PROBE_GRACE: Duration = Duration::from_secs(1);

/// Shortest period the loop will run at; tokio's interval rejects zero
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Receives every snapshot the scheduler commits
pub trait TickRecorder: Send + Sync {
    fn record_tick(&self, snapshot: &HealthSnapshot);
}

pub struct PollScheduler {
    registry: EndpointRegistry,
    store: HealthStore,
    prober: Arc<dyn Probe>,
    recorder: Arc<dyn TickRecorder>,
    interval: Duration,
    timeout: Duration,
    next_tick: u64,
}

impl PollScheduler {
    /// Create a scheduler that will publish into `store`
    ///
    /// # Arguments
    /// * `recorder` - told about every committed snapshot (metrics)
    /// * `interval` - time between the starts of consecutive ticks
    /// * `timeout` - per-probe timeout handed to the prober
    pub fn new(
        registry: EndpointRegistry,
        store: HealthStore,
        prober: Arc<dyn Probe>,
        recorder: Arc<dyn TickRecorder>,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        let next_tick = store.current().tick() + 1;
        Self {
            registry,
            store,
            prober,
            recorder,
            interval,
            timeout,
            next_tick,
        }
    }

    /// Run ticks until shutdown is signalled
    ///
    /// The first tick starts immediately. Cadence is measured start to start;
    /// a tick that overruns the interval delays the next one instead of
    /// triggering a burst. A tick in progress always commits before shutdown
    /// is observed.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        info!(
            endpoints = self.registry.len(),
            interval_secs = self.interval.as_secs_f64(),
            timeout_secs = self.timeout.as_secs_f64(),
            "Starting poll scheduler"
        );

        if self.interval < MIN_INTERVAL {
            warn!(
                interval_secs = self.interval.as_secs_f64(),
                "Check interval too short; using 1ms"
            );
        }
        let mut ticker = tokio::time::interval(self.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!("Poll scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick_once().await;
                }
            }
        }
    }

    /// Probe every endpoint once and publish the resulting snapshot
    ///
    /// Returns the snapshot that is current afterwards.
    pub async fn tick_once(&mut self) -> Arc<HealthSnapshot> {
        let tick = self.next_tick;
        let started = Instant::now();
        let previous = self.store.current();

        let results = self.probe_all().await;
        let snapshot = HealthSnapshot::from_results(tick, self.registry.clone(), results);

        match self.store.publish(snapshot) {
            Ok(published) => {
                self.next_tick = tick + 1;
                self.recorder.record_tick(&published);

                let up = published.results().filter(|r| r.up).count();
                debug!(
                    tick = tick,
                    up = up,
                    total = self.registry.len(),
                    can_deploy = published.can_deploy(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tick committed"
                );

                match (previous.can_deploy(), published.can_deploy()) {
                    (false, true) => info!(tick = tick, "Deployment gate opened"),
                    (true, false) => warn!(tick = tick, up = up, "Deployment gate closed"),
                    _ => {}
                }

                published
            }
            Err(e) => {
                error!(error = %e, "Refusing to publish snapshot");
                let current = self.store.current();
                self.next_tick = current.tick() + 1;
                current
            }
        }
    }

    /// Fan out one probe task per endpoint and collect every result
    ///
    /// A task that panics or outlives `timeout + PROBE_GRACE` is recorded as
    /// down with the timeout as its latency.
    async fn probe_all(&self) -> Vec<EndpointResult> {
        let timeout = self.timeout;
        let deadline = timeout + PROBE_GRACE;

        let probes = self.registry.iter().map(|url| {
            let url = url.to_string();
            let prober = Arc::clone(&self.prober);
            let mut handle = tokio::spawn({
                let url = url.clone();
                async move { prober.check(&url, timeout).await }
            });

            async move {
                match tokio::time::timeout(deadline, &mut handle).await {
                    Ok(Ok(result)) => EndpointResult { url, ..result },
                    Ok(Err(join_error)) => {
                        error!(url = %url, error = %join_error, "Probe task failed");
                        EndpointResult::failed(
                            url,
                            timeout,
                            ProbeFailure::Internal(join_error.to_string()),
                        )
                    }
                    Err(_elapsed) => {
                        handle.abort();
                        error!(
                            url = %url,
                            deadline_ms = deadline.as_millis() as u64,
                            "Probe ignored its timeout; abandoning"
                        );
                        EndpointResult::failed(url, timeout, ProbeFailure::Timeout)
                    }
                }
            }
        });

        join_all(probes).await
    }
}
