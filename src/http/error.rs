//! Client error taxonomy.

use thiserror::Error;

use crate::cancel::AbortReason;

/// Errors surfaced by the client runtime.
///
/// `Clone` so one refresh outcome can be handed to every waiter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The backend answered with a non-success status.
    #[error("{method} {path} failed with status {status}: {message}")]
    Http {
        status: u16,
        method: String,
        path: String,
        message: String,
    },

    /// No response at all (connection refused, reset, DNS). Status 0.
    #[error("network error: {0}")]
    Network(String),

    /// The per-request deadline elapsed.
    #[error("request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Aborted explicitly, superseded by a newer request, or the caller's scope ended.
    #[error("request canceled: {reason}")]
    Cancelled { reason: AbortReason },

    /// The refresh endpoint answered without a usable access token.
    #[error("malformed refresh response: {0}")]
    MalformedRefresh(String),

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request could not be built (bad URL, header, or body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// HTTP status of the failure; 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ClientError::Http { status, .. } => *status,
            _ => 0,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, ClientError::Cancelled { .. })
    }

    pub fn is_transient(&self) -> bool {
        crate::resilience::is_transient(self)
    }

    /// 401, or 419 ("authentication timeout").
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self.status(), 401 | 419)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == 403
    }

    pub(crate) fn from_abort(reason: AbortReason, after_ms: u64) -> Self {
        match reason {
            AbortReason::Timeout => ClientError::Timeout { after_ms },
            reason => ClientError::Cancelled { reason },
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout { after_ms: 0 }
        } else if err.is_builder() {
            ClientError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
