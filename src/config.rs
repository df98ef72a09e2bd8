//! Startup configuration for the monitor
//!
//! Everything is read once from environment variables and stays fixed for
//! the lifetime of the process:
//! - `GATEWATCH_ENDPOINTS` - comma-separated list of URLs to probe
//! - `GATEWATCH_CHECK_INTERVAL_SECS` - seconds between tick starts (default: 20)
//! - `GATEWATCH_PROBE_TIMEOUT_SECS` - per-probe timeout in seconds (default: 3)
//! - `GATEWATCH_PORT` - HTTP listen port (default: 8000)
//! - `GATEWATCH_GRAFANA_URL` - optional Grafana dashboard to embed in `/`

use reqwest::Url;
use std::time::Duration;
use thiserror::Error;

/// Default time between the starts of two consecutive ticks
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(20);

/// Default per-probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Default port for the HTTP surface
pub const DEFAULT_PORT: u16 = 8000;

/// Endpoints monitored when `GATEWATCH_ENDPOINTS` is not set
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://api.sap.com/api/ConcurSharedLists/overview",
    "https://api.sap.com/products/SAPS4HANACloud/apis/packages",
    "https://api.sap.com/odata/1.0/catalog.svc/",
    "https://api.sap.com/content-type/API/apis/all",
];

pub const ENV_ENDPOINTS: &str = "GATEWATCH_ENDPOINTS";
pub const ENV_CHECK_INTERVAL: &str = "GATEWATCH_CHECK_INTERVAL_SECS";
pub const ENV_PROBE_TIMEOUT: &str = "GATEWATCH_PROBE_TIMEOUT_SECS";
pub const ENV_PORT: &str = "GATEWATCH_PORT";
pub const ENV_GRAFANA_URL: &str = "GATEWATCH_GRAFANA_URL";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} is not a valid number: {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be a positive number of seconds, got {value}")]
    NonPositiveDuration { var: &'static str, value: f64 },

    #[error("invalid endpoint URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("no endpoints configured")]
    NoEndpoints,
}

/// Monitor configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// URLs to probe, deduplicated, in configured order
    pub endpoints: Vec<String>,
    /// Time between the starts of two consecutive ticks
    pub check_interval: Duration,
    /// Upper bound for a single probe
    pub probe_timeout: Duration,
    /// HTTP listen port
    pub port: u16,
    /// Grafana dashboard embedded in the HTML view
    pub grafana_url: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            check_interval: DEFAULT_CHECK_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            port: DEFAULT_PORT,
            grafana_url: None,
        }
    }
}

impl MonitorConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup
    ///
    /// Unset or blank variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let endpoints = match get(ENV_ENDPOINTS) {
            Some(raw) => parse_endpoints(&raw)?,
            None => DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
        };

        let check_interval = match get(ENV_CHECK_INTERVAL) {
            Some(raw) => parse_seconds(ENV_CHECK_INTERVAL, &raw)?,
            None => DEFAULT_CHECK_INTERVAL,
        };

        let probe_timeout = match get(ENV_PROBE_TIMEOUT) {
            Some(raw) => parse_seconds(ENV_PROBE_TIMEOUT, &raw)?,
            None => DEFAULT_PROBE_TIMEOUT,
        };

        let port = match get(ENV_PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
                var: ENV_PORT,
                value: raw.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            endpoints,
            check_interval,
            probe_timeout,
            port,
            grafana_url: get(ENV_GRAFANA_URL),
        })
    }
}

/// Split, validate and deduplicate a comma-separated endpoint list
fn parse_endpoints(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut endpoints: Vec<String> = Vec::new();

    for candidate in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let url = Url::parse(candidate).map_err(|e| ConfigError::InvalidUrl {
            url: candidate.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: candidate.to_string(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        if !endpoints.iter().any(|existing| existing == candidate) {
            endpoints.push(candidate.to_string());
        }
    }

    if endpoints.is_empty() {
        return Err(ConfigError::NoEndpoints);
    }

    Ok(endpoints)
}

fn parse_seconds(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let value: f64 = raw.parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })?;

    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::NonPositiveDuration { var, value });
    }

    let duration = Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })?;

    // Values below one nanosecond round down to zero
    if duration.is_zero() {
        return Err(ConfigError::NonPositiveDuration { var, value });
    }

    Ok(duration)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
