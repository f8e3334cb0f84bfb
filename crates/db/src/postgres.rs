//! PostgreSQL-backed [`JobStore`].
//!
//! Jobs live in `print_jobs` with the nested file list, settings and payment
//! stored as JSONB. A row trigger publishes every insert/update/delete on the
//! [`CHANGE_CHANNEL`] notification channel; [`PgJobStore::subscribe`] listens
//! on it, classifies each notification against the caller's filter and loads
//! the current row for added/modified changes.

use async_trait::async_trait;
use futures::StreamExt;
use printsuit_core::job::{PaymentSummary, PrintFile, PrintJob, PrintSettings};
use printsuit_core::types::{JobId, Timestamp, UserId};
use printsuit_core::user::User;
use serde::Deserialize;
use sqlx::postgres::PgListener;
use sqlx::types::Json;

use crate::change::{classify, ChangeKind, JobChange, RowFields};
use crate::error::StoreError;
use crate::store::{ChangeFeed, JobFilter, JobStore, MarkNotified};
use crate::DbPool;

/// Notification channel written by the `print_jobs` change trigger.
pub const CHANGE_CHANNEL: &str = "print_job_changes";

const JOB_COLUMNS: &str =
    "id, user_id, status, notified, files, settings, payment, hub_name, created_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: String,
    user_id: String,
    status: String,
    notified: bool,
    files: Json<Vec<PrintFile>>,
    settings: Option<Json<PrintSettings>>,
    payment: Option<Json<PaymentSummary>>,
    hub_name: Option<String>,
    created_at: Timestamp,
}

impl From<JobRow> for PrintJob {
    fn from(row: JobRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            notified: row.notified,
            files: row.files.0,
            settings: row.settings.map(|s| s.0),
            payment: row.payment.map(|p| p.0),
            hub_name: row.hub_name,
            created_at: Some(row.created_at),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: Option<String>,
    name: Option<String>,
    role: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            role: row.role,
        }
    }
}

/// Payload published by the change trigger.
#[derive(Debug, Deserialize)]
struct ChangeNotification {
    id: String,
    before: Option<RowFields>,
    after: Option<RowFields>,
}

// ---------------------------------------------------------------------------
// PgJobStore
// ---------------------------------------------------------------------------

/// [`JobStore`] over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgJobStore {
    pool: DbPool,
}

impl PgJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn fetch_job(pool: &DbPool, id: &str) -> Result<Option<PrintJob>, sqlx::Error> {
    let query = format!("SELECT {JOB_COLUMNS} FROM print_jobs WHERE id = $1");
    let row = sqlx::query_as::<_, JobRow>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(PrintJob::from))
}

/// Turn one trigger payload into a change relative to `filter`.
///
/// Returns `Ok(None)` for writes outside the filter, and for added/modified
/// rows that were deleted before they could be loaded.
async fn resolve_notification(
    pool: &DbPool,
    filter: &JobFilter,
    payload: &str,
) -> Result<Option<JobChange>, StoreError> {
    let notification: ChangeNotification = serde_json::from_str(payload)?;

    let Some(kind) = classify(
        filter,
        notification.before.as_ref(),
        notification.after.as_ref(),
    ) else {
        return Ok(None);
    };

    if kind == ChangeKind::Removed {
        return Ok(Some(JobChange::Removed(notification.id)));
    }

    let job = fetch_job(pool, &notification.id).await?;
    Ok(job.map(|job| JobChange::new(kind, job)))
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn get_job(&self, id: &JobId) -> Result<Option<PrintJob>, StoreError> {
        Ok(fetch_job(&self.pool, id).await?)
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<PrintJob>, StoreError> {
        let query = format!(
            "SELECT {JOB_COLUMNS} FROM print_jobs \
             WHERE status = $1 AND ($2::boolean IS NULL OR notified = $2) \
             ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, JobRow>(&query)
            .bind(&filter.status)
            .bind(filter.notified)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(PrintJob::from).collect())
    }

    async fn mark_notified(&self, id: &JobId) -> Result<MarkNotified, StoreError> {
        let result = sqlx::query(
            "UPDATE print_jobs SET notified = true, updated_at = now() \
             WHERE id = $1 AND notified = false",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(MarkNotified::Marked);
        }

        let exists: Option<bool> =
            sqlx::query_scalar("SELECT notified FROM print_jobs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match exists {
            Some(_) => MarkNotified::AlreadyNotified,
            None => MarkNotified::NotFound,
        })
    }

    async fn subscribe(&self, filter: &JobFilter) -> Result<ChangeFeed, StoreError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        tracing::debug!(channel = CHANGE_CHANNEL, status = %filter.status, "Listening for job changes");

        let pool = self.pool.clone();
        let filter = filter.clone();

        let feed = listener.into_stream().filter_map(move |item| {
            let pool = pool.clone();
            let filter = filter.clone();
            async move {
                match item {
                    Ok(notification) => {
                        resolve_notification(&pool, &filter, notification.payload())
                            .await
                            .transpose()
                    }
                    Err(e) => Some(Err(StoreError::Database(e))),
                }
            }
        });

        Ok(Box::pin(feed))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}
