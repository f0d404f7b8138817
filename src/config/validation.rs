//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Base URL must parse as an absolute http(s) URL
//! - Backoff constants must describe a growing, bounded delay
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.api.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError {
            field: "api.base_url",
            message: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError {
            field: "api.base_url",
            message: format!("'{}' is not a valid URL ({})", config.api.base_url, e),
        }),
    }

    if config.api.connect_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "api.connect_timeout_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.api.refresh_timeout_ms == 0 {
        errors.push(ValidationError {
            field: "api.refresh_timeout_ms",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.backoff.base_delay_ms == 0 {
        errors.push(ValidationError {
            field: "backoff.base_delay_ms",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.backoff.max_delay_ms < config.backoff.base_delay_ms {
        errors.push(ValidationError {
            field: "backoff.max_delay_ms",
            message: format!(
                "cap {}ms is below base delay {}ms",
                config.backoff.max_delay_ms, config.backoff.base_delay_ms
            ),
        });
    }

    if !config.navigation.admin_prefix.starts_with('/') {
        errors.push(ValidationError {
            field: "navigation.admin_prefix",
            message: "must start with '/'".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
