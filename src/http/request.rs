//! Request descriptors.
//!
//! # Responsibilities
//! - Carry the per-call policy (anonymity, auth header, cancel group, retry, timeout)
//! - Carry the derived per-request state the pipeline mutates between attempts
//! - Generate a unique request ID for correlation
//!
//! # Design Decisions
//! - Policy is declared by the caller; the pipeline never infers it
//! - Bodies are serialized once up front so every attempt sends the same bytes

use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::http::error::ClientError;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Endpoints exempt from bearer attachment and from refresh-on-401.
pub const AUTH_ENDPOINTS: [&str; 4] = ["/auth/login", "/auth/register", "/auth/refresh", "/auth/logout"];

/// True if `path` (query string ignored) is one of [`AUTH_ENDPOINTS`].
pub fn is_auth_endpoint(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    let path = path.trim_end_matches('/');
    AUTH_ENDPOINTS.contains(&path)
}

/// Unique ID of one logical request (shared by all its attempts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-call policy.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// On 401/419 resolve with an empty 204 instead of refreshing.
    pub allow_anonymous: bool,
    /// Never attach the stored bearer. A 401 still refreshes and retries once.
    pub skip_auth_header: bool,
    /// Starting a request in this group aborts the group's previous request.
    pub cancel_group: Option<String>,
    /// Extra attempts for transient GET failures.
    pub retry: u32,
    /// Wall-clock ceiling per attempt.
    pub timeout: Option<Duration>,
    /// Caller's cancellation scope.
    pub signal: Option<CancellationToken>,
    /// Query parameters.
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn allow_anonymous(mut self) -> Self {
        self.allow_anonymous = true;
        self
    }

    #[must_use]
    pub fn skip_auth_header(mut self) -> Self {
        self.skip_auth_header = true;
        self
    }

    #[must_use]
    pub fn cancel_group(mut self, group: impl Into<String>) -> Self {
        self.cancel_group = Some(group.into());
        self
    }

    #[must_use]
    pub fn retry(mut self, attempts: u32) -> Self {
        self.retry = attempts;
        self
    }

    #[must_use]
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Some(Duration::from_millis(ms));
        self
    }

    #[must_use]
    pub fn signal(mut self, token: CancellationToken) -> Self {
        self.signal = Some(token);
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub(crate) fn timeout_ms_or_zero(&self) -> u64 {
        self.timeout.map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

/// Typed context one logical request carries through the pipeline.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub options: RequestOptions,
    pub request_id: RequestId,
    /// Set once a 401 triggered a refresh; a second 401 then propagates.
    pub retried_for_auth: bool,
    /// Transient retries performed so far.
    pub retry_attempt: u32,
    /// Token minted by a refresh, attached to the auth retry.
    pub bearer_override: Option<String>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            options,
            request_id: RequestId::new(),
            retried_for_auth: false,
            retry_attempt: 0,
            bearer_override: None,
        }
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::InvalidRequest(format!("failed to serialize body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn is_auth_endpoint(&self) -> bool {
        is_auth_endpoint(&self.path)
    }

    /// How the request interceptor obtains a bearer for this call.
    pub fn bearer_policy(&self) -> BearerPolicy {
        if self.is_auth_endpoint() || self.options.skip_auth_header {
            BearerPolicy::Never
        } else if self.options.allow_anonymous {
            BearerPolicy::IfPresent
        } else {
            BearerPolicy::Resolve
        }
    }
}

/// Bearer attachment rule for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerPolicy {
    /// Auth endpoints and `skip_auth_header`: never attach.
    Never,
    /// Anonymous-tolerant: attach the in-memory token if any, never refresh for one.
    IfPresent,
    /// Attach the in-memory token, refreshing first if there is none.
    Resolve,
}
