//! Print job records.
//!
//! Jobs are written by the submission and fulfillment flows; the notifier
//! only ever reads them and flips [`PrintJob::notified`]. Most fields are
//! optional because older documents were written with sparse payloads.

use serde::{Deserialize, Serialize};

use crate::types::{JobId, Timestamp, UserId};

/// A single print job document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    pub id: JobId,
    pub user_id: UserId,
    /// Lifecycle status literal, see [`crate::status`].
    pub status: String,
    /// Dedup marker: set once the completion email has been delivered.
    #[serde(default)]
    pub notified: bool,
    #[serde(default)]
    pub files: Vec<PrintFile>,
    pub settings: Option<PrintSettings>,
    pub payment: Option<PaymentSummary>,
    pub hub_name: Option<String>,
    pub created_at: Option<Timestamp>,
}

impl PrintJob {
    /// Create a bare job with the given id, owner and status.
    ///
    /// All optional fields are empty and `notified` is `false`.
    pub fn new(id: impl Into<JobId>, user_id: impl Into<UserId>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            status: status.into(),
            notified: false,
            files: Vec::new(),
            settings: None,
            payment: None,
            hub_name: None,
            created_at: None,
        }
    }

    /// Whether the job is in `completion_status` and still owes an email.
    pub fn awaits_notification(&self, completion_status: &str) -> bool {
        self.status == completion_status && !self.notified
    }
}

/// An uploaded document within a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintFile {
    pub file_name: Option<String>,
    pub page_count: Option<u32>,
    /// Computed price in rupees.
    pub price: Option<f64>,
}

/// Print options chosen at submission time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintSettings {
    /// `black` or `color`.
    pub color: Option<String>,
    pub paper_size: Option<String>,
    pub copies: Option<u32>,
    pub double_sided: Option<bool>,
    pub orientation: Option<String>,
    /// Free-form range such as `1-3,5`, or `all`.
    pub page_range: Option<String>,
}

/// Payment captured for the job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub order_id: Option<String>,
    pub amount: Option<f64>,
}
