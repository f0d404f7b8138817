//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the API client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend endpoint settings.
    pub api: ApiConfig,

    /// Transient-failure backoff constants.
    pub backoff: BackoffConfig,

    /// Client-side navigation hooks (403 handling).
    pub navigation: NavigationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every request path is appended to (e.g., "http://localhost:8080/api").
    pub base_url: String,

    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Overall deadline for `POST /auth/refresh` in milliseconds.
    pub refresh_timeout_ms: u64,

    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            connect_timeout_secs: 5,
            refresh_timeout_ms: 10_000,
            user_agent: format!("teamanalyzer-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }
}

/// Exponential backoff for transient GET retries.
///
/// `delay = min(base * 2^attempt, cap) + uniform[0, jitter)`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound of the exponential part in milliseconds.
    pub max_delay_ms: u64,

    /// Exclusive upper bound of the random jitter in milliseconds.
    pub jitter_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 150,
            max_delay_ms: 2000,
            jitter_ms: 100,
        }
    }
}

/// Where the client sends the user when the backend denies an admin call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Path prefix of the admin namespace.
    pub admin_prefix: String,

    /// Landing location for a 403 on an admin path.
    pub denied_location: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            admin_prefix: "/admin".to_string(),
            denied_location: "/forbidden".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
