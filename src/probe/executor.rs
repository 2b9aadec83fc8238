//! Outbound HTTP probe execution

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::trace;

use super::ProbeOutcome;

/// Issues a single HTTP GET per target URL
///
/// The client is built once and reused across probes. Two guarantees:
///
/// - a hard timeout bounds every attempt; a probe never blocks its
///   caller longer than the configured duration
/// - TLS certificate validation stays enabled for https URLs (rustls
///   with the standard root bundle)
///
/// A failed probe is final for the current cycle; retries happen only
/// when the next cycle comes around.
pub struct ProbeExecutor {
    client: reqwest::Client,
}

impl ProbeExecutor {
    pub fn new(timeout: Duration) -> Result<Self> {
        // Redirects are not followed: a 3xx is reported as-is so the
        // classifier can count it as down
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// Probe one URL, reporting the result as a value
    ///
    /// Transport failures (DNS, refused connection, TLS, timeout) are
    /// captured in the outcome, never returned as errors.
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        trace!("probing {url}");

        let start = Instant::now();

        match self.client.get(url).send().await {
            Ok(response) => {
                let elapsed = start.elapsed();
                ProbeOutcome::response(response.status().as_u16(), elapsed)
            }
            Err(e) => ProbeOutcome::failure(e.to_string()),
        }
    }
}
