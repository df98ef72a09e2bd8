//! Continuous health polling
//!
//! The monitor is built from four pieces:
//! - [`EndpointRegistry`] - immutable list of URLs fixed at startup
//! - [`Probe`] / [`HttpProber`] - one bounded health check per URL
//! - [`HealthStore`] - single-writer, many-reader holder of the current [`HealthSnapshot`]
//! - [`PollScheduler`] - the background loop that probes every URL each tick and
//!   publishes a fresh snapshot
//!
//! [`QuerySurface`] is the read-only view the HTTP layer answers from.

mod prober;
mod query;
mod registry;
mod scheduler;
mod store;

pub use prober::{HttpProber, Probe, ProbeFailure};
pub use query::{EndpointStatus, GateResponse, QuerySurface, StatusResponse};
pub use registry::EndpointRegistry;
pub use scheduler::{PollScheduler, TickRecorder, PROBE_GRACE};
pub use store::{EndpointResult, HealthSnapshot, HealthStore, StoreError};

#[cfg(test)]
#[path = "prober_test.rs"]
mod prober_tests;

#[cfg(test)]
#[path = "store_test.rs"]
mod store_tests;

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_tests;

#[cfg(test)]
#[path = "query_test.rs"]
mod query_tests;
