//! Cooperative cancellation subsystem.
//!
//! # Data Flow
//! ```text
//! request interceptor
//!     → controller.rs (one AbortController per attempt)
//!     → registry.rs (cancel group: newest request owns the group)
//!     → timeouts / caller scope abort the same controller
//!
//! caller (view state)
//!     → staleness.rs (latest-wins check before applying a result)
//! ```
//!
//! # Design Decisions
//! - One abort path per attempt: supersession, deadline, and caller scope
//!   all fire the same token and record why
//! - Cleanup is identity-checked and driven by RAII guards

pub mod controller;
pub mod registry;
pub mod staleness;

pub use controller::{AbortController, AbortReason};
pub use registry::{CancelGroups, GroupLease};
pub use staleness::{RunId, RunTracker};
