//! Client metrics.
//!
//! # Metrics
//! - `client_requests_total` (counter): settled requests by method, status
//! - `client_request_duration_seconds` (histogram): end-to-end latency incl. retries
//! - `client_retries_total` (counter): resubmissions by kind (`auth`, `transient`)
//! - `client_refresh_total` (counter): refresh flights by outcome
//! - `client_cancellations_total` (counter): aborts by reason
//!
//! Nothing is exported here; a host application installs a recorder
//! (e.g. a Prometheus exporter) if it wants the numbers.

use metrics::{counter, histogram};

use crate::cancel::AbortReason;

pub const REQUESTS_TOTAL: &str = "client_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "client_request_duration_seconds";
pub const RETRIES_TOTAL: &str = "client_retries_total";
pub const REFRESH_TOTAL: &str = "client_refresh_total";
pub const CANCELLATIONS_TOTAL: &str = "client_cancellations_total";

/// Why a request was resubmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    /// After a successful refresh following a 401/419.
    Auth,
    /// After a transient GET failure and a backoff delay.
    Transient,
}

impl RetryKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Transient => "transient",
        }
    }
}

/// Record one settled logical request. `status` is 0 when no response arrived.
pub fn record_request(method: &str, status: u16, duration_seconds: f64) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "method" => method.to_string()).record(duration_seconds);
}

pub fn record_retry(kind: RetryKind) {
    counter!(RETRIES_TOTAL, "kind" => kind.as_str()).increment(1);
}

pub fn record_refresh(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(REFRESH_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_cancellation(reason: AbortReason) {
    counter!(CANCELLATIONS_TOTAL, "reason" => reason.as_str()).increment(1);
}
