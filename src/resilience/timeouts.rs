//! Timeout enforcement.
//!
//! # Responsibilities
//! - Arm a per-request deadline that aborts the request's controller
//! - Disarm the deadline as soon as the attempt settles
//!
//! # Design Decisions
//! - The deadline fires through the same cancellation token as supersession
//!   and caller cancellation, so a request has exactly one abort path
//! - Timed-out requests surface as `ClientError::Timeout` (transient)

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::cancel::{AbortController, AbortReason};

/// A RAII guard over a scheduled abort. Dropping it clears the timer.
#[derive(Debug)]
pub struct DeadlineTimer {
    handle: JoinHandle<()>,
    after: Duration,
}

impl DeadlineTimer {
    /// Schedule `controller` to abort with [`AbortReason::Timeout`] after `after`.
    pub fn arm(controller: &AbortController, after: Duration) -> Self {
        let controller = controller.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(after) => {
                    controller.abort(AbortReason::Timeout);
                }
                // Already aborted for another reason; nothing left to do.
                _ = controller.cancelled() => {}
            }
        });
        Self { handle, after }
    }

    pub fn after(&self) -> Duration {
        self.after
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
