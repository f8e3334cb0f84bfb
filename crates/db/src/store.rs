//! The job store seam consumed by the notifier.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use printsuit_core::job::PrintJob;
use printsuit_core::types::{JobId, UserId};
use printsuit_core::user::User;

use crate::change::JobChange;
use crate::error::StoreError;

/// A live feed of changes to jobs matching a [`JobFilter`].
///
/// The feed ends when the underlying subscription is closed; consumers that
/// need to keep listening must subscribe again.
pub type ChangeFeed = Pin<Box<dyn Stream<Item = Result<JobChange, StoreError>> + Send>>;

// ---------------------------------------------------------------------------
// JobFilter
// ---------------------------------------------------------------------------

/// Field-equality filter over print jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFilter {
    /// Required status literal.
    pub status: String,
    /// When set, the `notified` marker must equal this value.
    pub notified: Option<bool>,
}

impl JobFilter {
    /// Match every job in `status`, regardless of the dedup marker.
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            notified: None,
        }
    }

    /// Additionally require `notified == value`.
    pub fn with_notified(mut self, value: bool) -> Self {
        self.notified = Some(value);
        self
    }

    /// Whether a row with the given status and marker falls inside the filter.
    pub fn matches_fields(&self, status: &str, notified: bool) -> bool {
        self.status == status && self.notified.map_or(true, |n| n == notified)
    }

    pub fn matches(&self, job: &PrintJob) -> bool {
        self.matches_fields(&job.status, job.notified)
    }
}

// ---------------------------------------------------------------------------
// MarkNotified
// ---------------------------------------------------------------------------

/// Result of the conditional `notified = true` write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkNotified {
    /// The marker flipped from `false` to `true` in this call.
    Marked,
    /// The marker was already `true`; nothing was written.
    AlreadyNotified,
    /// No job with that id exists.
    NotFound,
}

// ---------------------------------------------------------------------------
// JobStore
// ---------------------------------------------------------------------------

/// Read/update/subscribe access to print jobs and their owners.
///
/// Implementations must make [`mark_notified`](JobStore::mark_notified) a
/// compare-and-set: the marker is only written when it is still `false`.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Point lookup of a job.
    async fn get_job(&self, id: &JobId) -> Result<Option<PrintJob>, StoreError>;

    /// Point lookup of a user.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    /// All jobs matching `filter`, oldest first.
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<PrintJob>, StoreError>;

    /// Set `notified = true` if, and only if, it is currently `false`.
    async fn mark_notified(&self, id: &JobId) -> Result<MarkNotified, StoreError>;

    /// Subscribe to added/modified/removed changes relative to `filter`.
    async fn subscribe(&self, filter: &JobFilter) -> Result<ChangeFeed, StoreError>;

    /// Cheap round-trip used to decide whether a sweep should run at all.
    async fn health_check(&self) -> Result<(), StoreError>;
}
