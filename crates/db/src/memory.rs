//! In-process [`JobStore`] backed by maps behind a `tokio::sync::RwLock`.
//!
//! Every mutation is broadcast as a raw before/after row image so that
//! subscribers see the same added/modified/removed classification as the
//! PostgreSQL store. Two switches simulate failures:
//! [`set_offline`](MemoryJobStore::set_offline) fails every call, and
//! [`set_reject_writes`](MemoryJobStore::set_reject_writes) fails only
//! [`mark_notified`](JobStore::mark_notified).

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use printsuit_core::job::PrintJob;
use printsuit_core::types::{JobId, UserId};
use printsuit_core::user::User;
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::change::{classify, JobChange, RowFields};
use crate::error::StoreError;
use crate::store::{ChangeFeed, JobFilter, JobStore, MarkNotified};

/// Buffer capacity of the internal change channel.
const CHANGE_CAPACITY: usize = 256;

/// A committed write, as seen by subscribers.
#[derive(Debug, Clone)]
struct RowWrite {
    before: Option<PrintJob>,
    after: Option<PrintJob>,
}

#[derive(Default)]
struct Tables {
    jobs: BTreeMap<JobId, PrintJob>,
    users: HashMap<UserId, User>,
}

/// In-memory job and user store.
pub struct MemoryJobStore {
    tables: RwLock<Tables>,
    writes: broadcast::Sender<RowWrite>,
    offline: AtomicBool,
    reject_writes: AtomicBool,
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryJobStore {
    pub fn new() -> Self {
        let (writes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            tables: RwLock::new(Tables::default()),
            writes,
            offline: AtomicBool::new(false),
            reject_writes: AtomicBool::new(false),
        }
    }

    // -- Fault injection ----------------------------------------------------

    /// While offline, every [`JobStore`] call fails with
    /// [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// While set, [`JobStore::mark_notified`] fails without writing.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        Ok(())
    }

    // -- Direct mutation (not part of the notifier surface) -----------------

    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id.clone(), user);
    }

    /// Insert or replace a job, publishing the change.
    pub async fn upsert_job(&self, job: PrintJob) {
        let mut tables = self.tables.write().await;
        let before = tables.jobs.insert(job.id.clone(), job.clone());
        self.publish(before, Some(job));
    }

    /// Change a job's status, publishing the change. Returns `false` when the
    /// job does not exist.
    pub async fn set_status(&self, id: &str, status: &str) -> bool {
        let mut tables = self.tables.write().await;
        let Some(job) = tables.jobs.get_mut(id) else {
            return false;
        };
        let before = job.clone();
        job.status = status.to_string();
        let after = job.clone();
        self.publish(Some(before), Some(after));
        true
    }

    pub async fn remove_job(&self, id: &str) -> Option<PrintJob> {
        let mut tables = self.tables.write().await;
        let removed = tables.jobs.remove(id);
        if let Some(job) = &removed {
            self.publish(Some(job.clone()), None);
        }
        removed
    }

    /// Snapshot of a job, bypassing fault injection.
    pub async fn job(&self, id: &str) -> Option<PrintJob> {
        self.tables.read().await.jobs.get(id).cloned()
    }

    /// Broadcast a committed write. Callers hold the table write lock, so
    /// subscribers see writes in commit order.
    fn publish(&self, before: Option<PrintJob>, after: Option<PrintJob>) {
        // No receivers simply means nobody is subscribed.
        let _ = self.writes.send(RowWrite { before, after });
    }
}

/// Map a raw write onto a change relative to `filter`.
fn to_change(filter: &JobFilter, write: RowWrite) -> Option<JobChange> {
    let before = write.before.as_ref().map(RowFields::of);
    let after = write.after.as_ref().map(RowFields::of);
    let kind = classify(filter, before.as_ref(), after.as_ref())?;

    match (write.after, write.before) {
        (Some(job), _) => Some(JobChange::new(kind, job)),
        (None, Some(job)) => Some(JobChange::Removed(job.id)),
        (None, None) => None,
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get_job(&self, id: &JobId) -> Result<Option<PrintJob>, StoreError> {
        self.ensure_online()?;
        Ok(self.tables.read().await.jobs.get(id).cloned())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        self.ensure_online()?;
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<PrintJob>, StoreError> {
        self.ensure_online()?;
        Ok(self
            .tables
            .read()
            .await
            .jobs
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect())
    }

    async fn mark_notified(&self, id: &JobId) -> Result<MarkNotified, StoreError> {
        self.ensure_online()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes are rejected".into()));
        }

        let mut tables = self.tables.write().await;
        let Some(job) = tables.jobs.get_mut(id) else {
            return Ok(MarkNotified::NotFound);
        };
        if job.notified {
            return Ok(MarkNotified::AlreadyNotified);
        }
        let before = job.clone();
        job.notified = true;
        let after = job.clone();
        self.publish(Some(before), Some(after));
        Ok(MarkNotified::Marked)
    }

    async fn subscribe(&self, filter: &JobFilter) -> Result<ChangeFeed, StoreError> {
        self.ensure_online()?;
        let filter = filter.clone();

        let feed = BroadcastStream::new(self.writes.subscribe()).filter_map(move |item| {
            let change = match item {
                Ok(write) => to_change(&filter, write).map(Ok),
                Err(BroadcastStreamRecvError::Lagged(n)) => Some(Err(StoreError::Feed(
                    format!("subscriber lagged, {n} changes dropped"),
                ))),
            };
            futures::future::ready(change)
        });

        Ok(Box::pin(feed))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.ensure_online()
    }
}
