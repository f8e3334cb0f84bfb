/// Job document ids are opaque, store-assigned strings.
pub type JobId = String;

/// User ids match the owning-user id stored on each job.
pub type UserId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
