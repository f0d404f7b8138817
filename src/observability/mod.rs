//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! request pipeline, refresh pipeline, cancel groups
//!     → logging.rs (structured `tracing` events keyed by request_id)
//!     → metrics.rs (`metrics` facade counters and histograms)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every event of one logical request
//! - No exporter is installed; metrics are no-ops until a host adds a recorder

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
