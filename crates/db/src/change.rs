//! Change-feed events and their classification against a filter.
//!
//! Stores report raw row operations (insert, update, delete) together with
//! the row's filtered fields before and after the write. [`classify`] maps
//! that onto the added/modified/removed vocabulary of a filtered query: a row
//! is *added* when it enters the result set, *modified* while it stays in it
//! and *removed* when it leaves.

use printsuit_core::job::PrintJob;
use printsuit_core::types::JobId;
use serde::Deserialize;

use crate::store::JobFilter;

/// Kind of change relative to a filtered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// A single change delivered by a [`ChangeFeed`](crate::ChangeFeed).
#[derive(Debug, Clone, PartialEq)]
pub enum JobChange {
    Added(PrintJob),
    Modified(PrintJob),
    /// The job left the result set (status change or deletion).
    Removed(JobId),
}

impl JobChange {
    pub fn kind(&self) -> ChangeKind {
        match self {
            JobChange::Added(_) => ChangeKind::Added,
            JobChange::Modified(_) => ChangeKind::Modified,
            JobChange::Removed(_) => ChangeKind::Removed,
        }
    }

    pub fn job_id(&self) -> &str {
        match self {
            JobChange::Added(job) | JobChange::Modified(job) => &job.id,
            JobChange::Removed(id) => id,
        }
    }

    /// Build a change of `kind` for `job`.
    pub fn new(kind: ChangeKind, job: PrintJob) -> Self {
        match kind {
            ChangeKind::Added => JobChange::Added(job),
            ChangeKind::Modified => JobChange::Modified(job),
            ChangeKind::Removed => JobChange::Removed(job.id),
        }
    }
}

/// The filtered fields of a row at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RowFields {
    pub status: String,
    pub notified: bool,
}

impl RowFields {
    pub fn of(job: &PrintJob) -> Self {
        Self {
            status: job.status.clone(),
            notified: job.notified,
        }
    }
}

/// Classify a row write against `filter`.
///
/// `before` is `None` for inserts and `after` is `None` for deletes. Returns
/// `None` when the row is outside the filter on both sides.
pub fn classify(
    filter: &JobFilter,
    before: Option<&RowFields>,
    after: Option<&RowFields>,
) -> Option<ChangeKind> {
    let was_in = before.is_some_and(|r| filter.matches_fields(&r.status, r.notified));
    let is_in = after.is_some_and(|r| filter.matches_fields(&r.status, r.notified));

    match (was_in, is_in) {
        (false, true) => Some(ChangeKind::Added),
        (true, true) => Some(ChangeKind::Modified),
        (true, false) => Some(ChangeKind::Removed),
        (false, false) => None,
    }
}
