//! Health state store
//!
//! Holds exactly one current [`HealthSnapshot`]. Snapshots are immutable
//! values; publishing swaps a single pointer, so a reader always sees either
//! the whole pre-tick picture or the whole post-tick picture.

use crate::monitor::prober::ProbeFailure;
use crate::monitor::registry::EndpointRegistry;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("snapshot for tick {offered} is not newer than current tick {current}")]
    StaleSnapshot { offered: u64, current: u64 },
}

/// Outcome of one check of one URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointResult {
    pub url: String,
    /// True iff a 2xx response arrived within the timeout
    pub up: bool,
    /// Wall-clock duration of the attempt, recorded for failures too
    pub latency_seconds: f64,
    pub checked_at: DateTime<Utc>,
    pub failure: Option<ProbeFailure>,
}

impl EndpointResult {
    pub fn healthy(url: impl Into<String>, latency: Duration) -> Self {
        Self {
            url: url.into(),
            up: true,
            latency_seconds: latency.as_secs_f64(),
            checked_at: Utc::now(),
            failure: None,
        }
    }

    pub fn failed(url: impl Into<String>, latency: Duration, failure: ProbeFailure) -> Self {
        Self {
            url: url.into(),
            up: false,
            latency_seconds: latency.as_secs_f64(),
            checked_at: Utc::now(),
            failure: Some(failure),
        }
    }
}

/// Consistent picture of every endpoint after one tick
///
/// `can_deploy` is computed once, in the constructor, from the same results
/// the snapshot carries; it can never drift from them.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    tick: u64,
    completed_at: Option<DateTime<Utc>>,
    registry: EndpointRegistry,
    results: BTreeMap<String, EndpointResult>,
    can_deploy: bool,
}

impl HealthSnapshot {
    /// Fail-closed snapshot used before the first tick commits
    pub fn initial(registry: EndpointRegistry) -> Self {
        Self {
            tick: 0,
            completed_at: None,
            registry,
            results: BTreeMap::new(),
            can_deploy: false,
        }
    }

    /// Assemble the snapshot for a completed tick
    ///
    /// Results for URLs outside the registry are discarded. The gate opens
    /// only if the registry is non-empty and every registered URL has an
    /// `up` result.
    pub fn from_results(
        tick: u64,
        registry: EndpointRegistry,
        results: impl IntoIterator<Item = EndpointResult>,
    ) -> Self {
        let results: BTreeMap<String, EndpointResult> = results
            .into_iter()
            .filter(|r| registry.contains(&r.url))
            .map(|r| (r.url.clone(), r))
            .collect();

        let can_deploy = !registry.is_empty()
            && registry
                .iter()
                .all(|url| results.get(url).is_some_and(|r| r.up));

        Self {
            tick,
            completed_at: Some(Utc::now()),
            registry,
            results,
            can_deploy,
        }
    }

    /// Number of the tick that produced this snapshot (0 before the first)
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn can_deploy(&self) -> bool {
        self.can_deploy
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn result(&self, url: &str) -> Option<&EndpointResult> {
        self.results.get(url)
    }

    /// Results ordered by URL
    pub fn results(&self) -> impl Iterator<Item = &EndpointResult> {
        self.results.values()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Shared holder of the current snapshot
///
/// One writer (the scheduler) and any number of readers. Reads are lock-free
/// and never wait on a probe. Clone is cheap (Arc internally).
#[derive(Debug, Clone)]
pub struct HealthStore {
    current: Arc<ArcSwap<HealthSnapshot>>,
}

impl HealthStore {
    /// Create a store holding the fail-closed initial snapshot
    pub fn new(registry: EndpointRegistry) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(HealthSnapshot::initial(registry))),
        }
    }

    /// Latest published snapshot
    pub fn current(&self) -> Arc<HealthSnapshot> {
        self.current.load_full()
    }

    /// Replace the current snapshot
    ///
    /// The snapshot is fully built before this call, so it becomes visible
    /// in one step. Ticks must strictly increase; an older or equal tick is
    /// refused. The check and the swap are one compare-and-swap, so of two
    /// racing publishers offering the same tick exactly one wins.
    pub fn publish(&self, snapshot: HealthSnapshot) -> Result<Arc<HealthSnapshot>, StoreError> {
        let snapshot = Arc::new(snapshot);
        let mut current = self.current.load();

        loop {
            if snapshot.tick <= current.tick {
                return Err(StoreError::StaleSnapshot {
                    offered: snapshot.tick,
                    current: current.tick,
                });
            }

            let previous = self
                .current
                .compare_and_swap(&*current, Arc::clone(&snapshot));
            if Arc::ptr_eq(&*previous, &*current) {
                return Ok(snapshot);
            }

            // Another publisher got in first; re-check against its snapshot
            current = previous;
        }
    }
}
