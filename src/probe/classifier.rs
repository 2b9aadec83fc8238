//! Pure mapping from a probe outcome to a health verdict

use serde::{Deserialize, Serialize};

use super::ProbeOutcome;

/// Health status of a target at one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Up => write!(f, "up"),
            HealthStatus::Down => write!(f, "down"),
        }
    }
}

impl std::str::FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(HealthStatus::Up),
            "down" => Ok(HealthStatus::Down),
            other => Err(format!("unknown health status: {other}")),
        }
    }
}

/// Classified result of one probe
///
/// `latency` is the elapsed wall-clock time in seconds and is present
/// exactly when the target is up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub status: HealthStatus,
    pub latency: Option<f64>,
}

/// Statuses that count as healthy. Intentionally narrow: redirects and
/// every client/server error are down.
const HEALTHY_STATUSES: [u16; 2] = [200, 201];

/// Classify a probe outcome
///
/// Deterministic and side-effect free. A target is up only when a
/// response arrived with status 200 or 201; every other shape (other
/// status codes, transport errors, timeouts) is down with no latency.
pub fn classify(outcome: &ProbeOutcome) -> Verdict {
    match (outcome.succeeded, outcome.http_status, outcome.elapsed) {
        (true, Some(status), Some(elapsed)) if HEALTHY_STATUSES.contains(&status) => Verdict {
            status: HealthStatus::Up,
            latency: Some(elapsed.as_secs_f64()),
        },
        _ => Verdict {
            status: HealthStatus::Down,
            latency: None,
        },
    }
}
