//! On-demand completion check.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use printsuit_events::ReconcileOutcome;
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

/// Per-job entry in the check response.
///
/// `success` is true for every outcome except a failure. That includes a job
/// another task was already reconciling when this request reached it: the
/// entry only says this request did not fail, not that the email went out.
/// If that other task then fails delivery, the job stays unnotified and the
/// next pass retries it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub success: bool,
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ReconcileOutcome> for JobResult {
    fn from(outcome: &ReconcileOutcome) -> Self {
        Self {
            success: outcome.is_success(),
            job_id: outcome.job_id.clone(),
            error: outcome.error().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckCompletedJobsResponse {
    pub message: &'static str,
    pub results: Vec<JobResult>,
}

/// GET /check-completed-jobs -- reconcile every completed, unnotified job now.
///
/// Per-job failures are reported in `results` with a 200; only a failure to
/// list the jobs fails the request.
async fn check_completed_jobs(
    State(state): State<AppState>,
) -> AppResult<Json<CheckCompletedJobsResponse>> {
    let outcomes = state.reconciler.check_completed_jobs().await?;

    Ok(Json(CheckCompletedJobsResponse {
        message: "Processed completed jobs",
        results: outcomes.iter().map(JobResult::from).collect(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/check-completed-jobs", get(check_completed_jobs))
}
