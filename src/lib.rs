pub mod config;
pub mod monitor;
pub mod server;
pub mod shutdown;

// Re-export for main.rs and integration tests
pub use crate::config::{ConfigError, MonitorConfig};
pub use crate::monitor::{
    EndpointRegistry, EndpointResult, HealthSnapshot, HealthStore, HttpProber, PollScheduler,
    Probe, ProbeFailure, QuerySurface, TickRecorder,
};
