//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber for binaries and tests
//! - Honor `RUST_LOG`, falling back to the configured level
//!
//! # Design Decisions
//! - The library only emits events; installing a subscriber is the host's call
//! - Initialization is idempotent-safe: a second call reports an error instead of panicking

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(level: &str) -> String {
    format!("teamanalyzer_client={level},teamanalyzer_cli={level},warn")
}

/// Install a registry with an env filter and a fmt layer.
pub fn init_logging(level: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
}
