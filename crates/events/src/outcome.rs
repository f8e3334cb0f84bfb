//! Per-job reconciliation outcomes.

use printsuit_core::types::{JobId, UserId};
use printsuit_db::StoreError;

use crate::delivery::DeliveryError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Step of the reconciliation a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Lookup,
    Format,
    Delivery,
    WriteBack,
}

impl FailureStage {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureStage::Lookup => "lookup",
            FailureStage::Format => "format",
            FailureStage::Delivery => "delivery",
            FailureStage::WriteBack => "write_back",
        }
    }
}

/// Why a job's completion email was not delivered and recorded.
///
/// None of these leave `notified` set, so every failure is retried on the
/// next pass. Write-back failures are the exception in effect: the email went
/// out, and the next pass will send it again.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("job no longer exists")]
    JobMissing,

    #[error("job lookup failed")]
    JobLookup(#[source] StoreError),

    #[error("User not found")]
    UserNotFound { user_id: UserId },

    #[error("No user email")]
    MissingEmail { user_id: UserId },

    #[error("user lookup failed")]
    UserLookup(#[source] StoreError),

    #[error("invalid recipient address")]
    InvalidRecipient { address: String },

    #[error("delivery failed")]
    Delivery(#[source] DeliveryError),

    #[error("failed to record notification")]
    WriteBack(#[source] StoreError),
}

impl ReconcileError {
    pub fn stage(&self) -> FailureStage {
        match self {
            ReconcileError::JobMissing
            | ReconcileError::JobLookup(_)
            | ReconcileError::UserNotFound { .. }
            | ReconcileError::MissingEmail { .. }
            | ReconcileError::UserLookup(_) => FailureStage::Lookup,
            ReconcileError::InvalidRecipient { .. } => FailureStage::Format,
            ReconcileError::Delivery(_) => FailureStage::Delivery,
            ReconcileError::WriteBack(_) => FailureStage::WriteBack,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What happened to one job in one pass.
#[derive(Debug)]
pub enum Disposition {
    /// Email delivered and `notified` recorded.
    Sent,
    /// The dedup marker was already set; nothing sent.
    AlreadyNotified,
    /// Another task in this process is reconciling the job right now.
    InFlight,
    /// The stored job is no longer in the completion status.
    NotEligible,
    Failed(ReconcileError),
}

#[derive(Debug)]
pub struct ReconcileOutcome {
    pub job_id: JobId,
    pub disposition: Disposition,
}

impl ReconcileOutcome {
    pub fn new(job_id: impl Into<JobId>, disposition: Disposition) -> Self {
        Self {
            job_id: job_id.into(),
            disposition,
        }
    }

    /// Everything except a failure counts as success.
    pub fn is_success(&self) -> bool {
        !matches!(self.disposition, Disposition::Failed(_))
    }

    pub fn is_sent(&self) -> bool {
        matches!(self.disposition, Disposition::Sent)
    }

    pub fn error(&self) -> Option<&ReconcileError> {
        match &self.disposition {
            Disposition::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Aggregate counts for logging a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub total: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PassSummary {
    pub fn of(outcomes: &[ReconcileOutcome]) -> Self {
        outcomes.iter().fold(
            Self {
                total: outcomes.len(),
                ..Self::default()
            },
            |mut acc, o| {
                match o.disposition {
                    Disposition::Sent => acc.sent += 1,
                    Disposition::Failed(_) => acc.failed += 1,
                    _ => acc.skipped += 1,
                }
                acc
            },
        )
    }
}
