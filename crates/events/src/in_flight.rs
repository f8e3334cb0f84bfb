//! Per-process claim set for jobs that are currently being reconciled.
//!
//! The sweep, the change-feed listener and the on-demand endpoint can all
//! pick up the same job at the same moment. Only the caller holding the
//! [`InFlightGuard`] for a job may send its email; the claim is released
//! when the guard drops.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use printsuit_core::types::JobId;

#[derive(Debug, Default)]
pub struct InFlightJobs {
    ids: Mutex<HashSet<JobId>>,
}

impl InFlightJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`, or return `None` if another task already holds it.
    pub fn try_claim(&self, id: &str) -> Option<InFlightGuard<'_>> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        if !ids.insert(id.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            owner: self,
            id: id.to_string(),
        })
    }
}

/// Releases the claim on drop.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    owner: &'a InFlightJobs,
    id: JobId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
