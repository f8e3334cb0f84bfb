/// Error type for job store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A query or connection failure from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A change notification payload could not be decoded.
    #[error("Malformed change notification: {0}")]
    Notification(#[from] serde_json::Error),

    /// The change feed fell behind or was interrupted.
    #[error("Change feed error: {0}")]
    Feed(String),

    /// The store refused the operation (outage, maintenance, fault injection).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
