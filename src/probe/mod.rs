//! Probe module for endpoint monitoring.
//!
//! A probe is one HTTP attempt against a target. Every failure is folded
//! into the returned [`ProbeOutcome`], so callers never handle an error.

mod http;

pub use http::*;

use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;

/// Request timeout applied to every probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Status code and round-trip time of a received response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeResponse {
    pub status_code: u16,
    /// Round-trip time in seconds
    pub response_time: f64,
}

/// Normalized result of a single probe attempt.
///
/// The status code and response time are either both present or both
/// absent; an outcome without a response is never available.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    available: bool,
    response: Option<ProbeResponse>,
    timestamp: DateTime<Utc>,
}

impl ProbeOutcome {
    /// Outcome for a request that received a response. Only a 200 is available.
    pub fn responded(status_code: u16, response_time: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            available: status_code == 200,
            response: Some(ProbeResponse {
                status_code,
                response_time,
            }),
            timestamp,
        }
    }

    /// Outcome for a request that never got a response (connection error, timeout).
    pub fn unreachable(timestamp: DateTime<Utc>) -> Self {
        Self {
            available: false,
            response: None,
            timestamp,
        }
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub fn status_code(&self) -> Option<u16> {
        self.response.map(|r| r.status_code)
    }

    pub fn response_time(&self) -> Option<f64> {
        self.response.map(|r| r.response_time)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Something that can issue a single probe against a URL.
pub trait Prober: Send + Sync + 'static {
    fn probe(&self, url: &str, timeout: Duration) -> impl Future<Output = ProbeOutcome> + Send;
}
