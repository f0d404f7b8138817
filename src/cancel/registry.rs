//! Cancel-group registry.
//!
//! # Responsibilities
//! - Map a logical group name to the controller of its newest request
//! - Abort the previous owner when a new request registers in the group
//! - Remove an entry on settle only if it still belongs to the settling request
//!
//! # Design Decisions
//! - Registration is a single map insert; the displaced controller is aborted
//!   after the swap, so there is never a window with two live owners
//! - Cleanup compares controller identity, so a superseded request finishing
//!   late cannot evict the newer request's entry

use std::sync::Arc;

use dashmap::DashMap;

use crate::cancel::controller::{AbortController, AbortReason};

/// Thread-safe registry of cancel groups. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct CancelGroups {
    inner: Arc<DashMap<String, AbortController>>,
}

impl CancelGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `controller` the owner of `group`, aborting the previous owner.
    pub fn register(&self, group: &str, controller: &AbortController) {
        let previous = self.inner.insert(group.to_string(), controller.clone());
        if let Some(previous) = previous {
            if !previous.same(controller) {
                tracing::debug!(group = %group, superseded = previous.id(), "Superseding request in cancel group");
                previous.abort(AbortReason::Superseded);
            }
        }
    }

    /// Abort and remove whatever currently owns `group`.
    ///
    /// Returns true if a live entry was found.
    pub fn abort_group(&self, group: &str) -> bool {
        match self.inner.remove(group) {
            Some((_, controller)) => {
                controller.abort(AbortReason::GroupAborted);
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `group` only if it is still `controller`.
    pub fn cleanup(&self, group: &str, controller: &AbortController) -> bool {
        self.inner
            .remove_if(group, |_, current| current.same(controller))
            .is_some()
    }

    /// Pass ownership of `group` from `from` to `to` without aborting anyone.
    ///
    /// Fails if `from` no longer owns the group.
    pub fn handover(&self, group: &str, from: &AbortController, to: &AbortController) -> bool {
        match self.inner.get_mut(group) {
            Some(mut current) if current.same(from) => {
                *current = to.clone();
                true
            }
            _ => false,
        }
    }

    /// Register and return a guard that cleans up on drop.
    pub fn lease(&self, group: &str, controller: &AbortController) -> GroupLease {
        self.register(group, controller);
        GroupLease {
            groups: self.clone(),
            group: group.to_string(),
            controller: controller.clone(),
        }
    }

    /// The controller currently owning `group`, if any.
    pub fn owner(&self, group: &str) -> Option<AbortController> {
        self.inner.get(group).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// A RAII guard over a group registration.
#[derive(Debug)]
pub struct GroupLease {
    groups: CancelGroups,
    group: String,
    controller: AbortController,
}

impl GroupLease {
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Move this lease to the next attempt's controller.
    pub fn handover(&mut self, to: &AbortController) -> bool {
        if !self.groups.handover(&self.group, &self.controller, to) {
            return false;
        }
        self.controller = to.clone();
        true
    }
}

impl Drop for GroupLease {
    fn drop(&mut self) {
        self.groups.cleanup(&self.group, &self.controller);
    }
}
