//! Single-endpoint health checks
//!
//! A probe never fails from the caller's point of view: every outcome,
//! including network errors and timeouts, comes back as an [`EndpointResult`].
//! Retries are the scheduler's business, not the prober's.

use crate::monitor::store::EndpointResult;
use async_trait::async_trait;
use serde::Serialize;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a check did not count as healthy
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeFailure {
    #[error("timed out")]
    Timeout,

    #[error("non-success status {0}")]
    Status(u16),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("internal fault: {0}")]
    Internal(String),
}

/// Health check seam
///
/// Implemented by [`HttpProber`] in production and by scripted doubles in
/// scheduler tests.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Check `url` once, bounded by `timeout`
    ///
    /// Latency is measured from just before the request is issued until the
    /// response body is drained, the timeout elapses, or the request fails.
    async fn check(&self, url: &str, timeout: Duration) -> EndpointResult;
}

/// Probe that issues `GET url` and treats any 2xx as healthy
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Create a prober with its own connection pool
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gatewatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Create a prober around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn check(&self, url: &str, timeout: Duration) -> EndpointResult {
        let started = Instant::now();

        let attempt = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            response.bytes().await?;
            Ok::<_, reqwest::Error>(status)
        };

        // Dropping `attempt` on timeout aborts the underlying connection.
        let outcome = tokio::time::timeout(timeout, attempt).await;
        let latency = started.elapsed();

        let failure = match outcome {
            Ok(Ok(status)) if status.is_success() => {
                debug!(
                    url = %url,
                    status = status.as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "Probe succeeded"
                );
                return EndpointResult::healthy(url, latency);
            }
            Ok(Ok(status)) => ProbeFailure::Status(status.as_u16()),
            Ok(Err(e)) => classify(&e),
            Err(_elapsed) => ProbeFailure::Timeout,
        };

        warn!(
            url = %url,
            failure = %failure,
            latency_ms = latency.as_millis() as u64,
            "Probe failed"
        );
        EndpointResult::failed(url, latency, failure)
    }
}

fn classify(error: &reqwest::Error) -> ProbeFailure {
    if error.is_timeout() {
        ProbeFailure::Timeout
    } else if error.is_connect() {
        ProbeFailure::Connect(error_chain(error))
    } else {
        ProbeFailure::Request(error_chain(error))
    }
}

/// Flatten an error and its sources into one line
///
/// reqwest's top-level message only names the URL; the cause (DNS, TLS,
/// refused) sits further down the chain.
fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
