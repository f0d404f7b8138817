//! Abort controller: a cancellation token that remembers why it fired.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

static NEXT_CONTROLLER_ID: AtomicU64 = AtomicU64::new(1);

/// Why a request was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// A newer request in the same cancel group took over.
    Superseded,
    /// The group was cancelled explicitly (e.g., on logout or navigation).
    GroupAborted,
    /// The caller's own cancellation scope fired.
    Caller,
    /// The per-request deadline elapsed.
    Timeout,
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbortReason::Superseded => "newer request",
            AbortReason::GroupAborted => "group aborted",
            AbortReason::Caller => "caller cancelled",
            AbortReason::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct Inner {
    id: u64,
    token: CancellationToken,
    reason: OnceLock<AbortReason>,
}

/// Owner of one request attempt's cancellation.
///
/// Clones share state; identity (for race-safe group cleanup) is by allocation.
#[derive(Debug, Clone)]
pub struct AbortController {
    inner: Arc<Inner>,
}

impl AbortController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                id: NEXT_CONTROLLER_ID.fetch_add(1, Ordering::Relaxed),
                token: CancellationToken::new(),
                reason: OnceLock::new(),
            }),
        }
    }

    /// Abort with `reason`. The first reason sticks; later calls are no-ops.
    pub fn abort(&self, reason: AbortReason) {
        if self.inner.reason.set(reason).is_ok() {
            tracing::debug!(controller = self.inner.id, reason = %reason, "Request aborted");
            self.inner.token.cancel();
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<AbortReason> {
        self.inner.reason.get().copied()
    }

    /// Resolves once the controller is aborted.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.token.cancelled()
    }

    /// True if both handles point at the same controller.
    pub fn same(&self, other: &AbortController) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}
