//! Read-only views over the current snapshot
//!
//! Nothing here probes or waits on a probe; answers always come from
//! whatever snapshot is published right now, stale or not.

use crate::monitor::prober::ProbeFailure;
use crate::monitor::store::{HealthSnapshot, HealthStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Body of `GET /api/gate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateResponse {
    pub can_deploy: bool,
}

/// Per-endpoint line of `GET /api/status`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStatus {
    pub url: String,
    pub up: bool,
    pub latency_seconds: Option<f64>,
    pub checked_at: Option<DateTime<Utc>>,
    pub failure: Option<ProbeFailure>,
}

/// Body of `GET /api/status`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    pub can_deploy: bool,
    pub tick: u64,
    pub last_check: Option<DateTime<Utc>>,
    pub endpoints: Vec<EndpointStatus>,
}

impl GateResponse {
    pub fn from_snapshot(snapshot: &HealthSnapshot) -> Self {
        Self {
            can_deploy: snapshot.can_deploy(),
        }
    }
}

impl StatusResponse {
    /// Build the status view, one entry per registered URL in registry order
    ///
    /// URLs without a result yet are reported down with no measurements.
    pub fn from_snapshot(snapshot: &HealthSnapshot) -> Self {
        let endpoints = snapshot
            .registry()
            .iter()
            .map(|url| match snapshot.result(url) {
                Some(result) => EndpointStatus {
                    url: url.to_string(),
                    up: result.up,
                    latency_seconds: Some(result.latency_seconds),
                    checked_at: Some(result.checked_at),
                    failure: result.failure.clone(),
                },
                None => EndpointStatus {
                    url: url.to_string(),
                    up: false,
                    latency_seconds: None,
                    checked_at: None,
                    failure: None,
                },
            })
            .collect();

        Self {
            can_deploy: snapshot.can_deploy(),
            tick: snapshot.tick(),
            last_check: snapshot.completed_at(),
            endpoints,
        }
    }
}

/// Query handle given to the HTTP layer
#[derive(Debug, Clone)]
pub struct QuerySurface {
    store: HealthStore,
}

impl QuerySurface {
    pub fn new(store: HealthStore) -> Self {
        Self { store }
    }

    /// The snapshot every view of one request should be derived from
    pub fn snapshot(&self) -> Arc<HealthSnapshot> {
        self.store.current()
    }

    pub fn gate(&self) -> GateResponse {
        GateResponse::from_snapshot(&self.snapshot())
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse::from_snapshot(&self.snapshot())
    }

    /// True once the first tick has been committed
    pub fn has_checked(&self) -> bool {
        self.snapshot().tick() > 0
    }
}
