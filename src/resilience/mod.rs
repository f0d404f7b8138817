//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (arm a deadline that aborts the request's controller)
//!     → On failure: retries.rs (transient? GET? budget left?)
//!     → backoff.rs (how long to wait before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Deadlines are per attempt, armed by the request interceptor
//! - Retries only for GET; every other method fails fast
//! - Cancellation is never mistaken for transience

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::{calculate_backoff, compute_backoff};
pub use retries::{is_transient, is_transient_status, should_retry};
pub use timeouts::DeadlineTimer;
