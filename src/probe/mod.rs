//! Probe pipeline: one outbound HTTP attempt per target, classified
//! into an up/down verdict.
//!
//! The pipeline is split into two halves so the decision logic stays
//! pure and testable:
//!
//! 1. [`executor::ProbeExecutor`] performs the network call and reports
//!    an explicit [`ProbeOutcome`] value - transport failures are data,
//!    not errors that bubble up.
//! 2. [`classifier::classify`] maps an outcome to a
//!    [`classifier::Verdict`] without any I/O.

pub mod classifier;
pub mod executor;

pub use classifier::{HealthStatus, Verdict, classify};
pub use executor::ProbeExecutor;

use std::time::Duration;

/// Raw result of a single probe attempt
///
/// Exactly one of the two shapes occurs:
/// - a response was received: `succeeded = true`, `http_status` and
///   `elapsed` are set
/// - the attempt failed (DNS, refused connection, TLS, timeout):
///   `succeeded = false`, `error` describes the cause
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub succeeded: bool,
    pub http_status: Option<u16>,
    pub elapsed: Option<Duration>,
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn response(http_status: u16, elapsed: Duration) -> Self {
        Self {
            succeeded: true,
            http_status: Some(http_status),
            elapsed: Some(elapsed),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            http_status: None,
            elapsed: None,
            error: Some(error.into()),
        }
    }
}
