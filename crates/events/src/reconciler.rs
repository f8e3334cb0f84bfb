//! The completion reconciler.
//!
//! [`CompletionReconciler::reconcile`] is the only code path that sends a
//! completion email or sets `notified`. For one job it runs, strictly in
//! order: dedup check, owner lookup, formatting, delivery, and the
//! conditional `notified = true` write. Each step that can fail is turned
//! into a [`ReconcileOutcome`]; nothing propagates to the caller.

use std::sync::Arc;

use futures::future::join_all;
use printsuit_core::completion_email::{self, TemplateOptions};
use printsuit_core::job::PrintJob;
use printsuit_db::{JobFilter, JobStore, MarkNotified, StoreError};

use crate::config::NotifierConfig;
use crate::delivery::{DeliveryGateway, OutboundEmail};
use crate::in_flight::InFlightJobs;
use crate::outcome::{Disposition, PassSummary, ReconcileError, ReconcileOutcome};

/// Decides whether a completed job owes an email, sends it, and records it.
pub struct CompletionReconciler {
    store: Arc<dyn JobStore>,
    gateway: Arc<dyn DeliveryGateway>,
    completion_status: String,
    from_address: String,
    template: TemplateOptions,
    in_flight: InFlightJobs,
}

impl CompletionReconciler {
    pub fn new(
        store: Arc<dyn JobStore>,
        gateway: Arc<dyn DeliveryGateway>,
        config: &NotifierConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            completion_status: config.completion_status.clone(),
            from_address: config.from_address.clone(),
            template: config.template.clone(),
            in_flight: InFlightJobs::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Filter selecting every job in the completion status.
    ///
    /// All trigger paths derive their query from this.
    pub fn completion_filter(&self) -> JobFilter {
        JobFilter::status(&self.completion_status)
    }

    /// Reconcile a single job record.
    pub async fn reconcile(&self, job: &PrintJob) -> ReconcileOutcome {
        let disposition = match self.try_reconcile(job).await {
            Ok(disposition) => disposition,
            Err(e) => {
                tracing::error!(
                    job_id = %job.id,
                    user_id = %job.user_id,
                    stage = e.stage().as_str(),
                    error = %e,
                    cause = ?std::error::Error::source(&e).map(ToString::to_string),
                    "Completion notification failed"
                );
                Disposition::Failed(e)
            }
        };
        ReconcileOutcome::new(job.id.clone(), disposition)
    }

    /// Reconcile many jobs concurrently, one outcome per job in input order.
    ///
    /// A failing job never affects the others.
    pub async fn reconcile_all(&self, jobs: &[PrintJob]) -> Vec<ReconcileOutcome> {
        join_all(jobs.iter().map(|job| self.reconcile(job))).await
    }

    /// One on-demand pass: every completed job whose marker is still unset.
    ///
    /// Jobs are listed by status only and filtered in-process with
    /// [`PrintJob::awaits_notification`]. There is no
    /// health probe; a listing failure is returned to the caller.
    pub async fn check_completed_jobs(&self) -> Result<Vec<ReconcileOutcome>, StoreError> {
        let jobs: Vec<PrintJob> = self
            .store
            .list_jobs(&self.completion_filter())
            .await?
            .into_iter()
            .filter(|job| job.awaits_notification(&self.completion_status))
            .collect();

        let outcomes = self.reconcile_all(&jobs).await;
        let summary = PassSummary::of(&outcomes);
        tracing::info!(
            total = summary.total,
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            "On-demand completion check finished"
        );
        Ok(outcomes)
    }

    async fn try_reconcile(&self, job: &PrintJob) -> Result<Disposition, ReconcileError> {
        if job.notified {
            return Ok(Disposition::AlreadyNotified);
        }

        let Some(_claim) = self.in_flight.try_claim(&job.id) else {
            tracing::debug!(job_id = %job.id, "Job already being reconciled, skipping");
            return Ok(Disposition::InFlight);
        };

        // Re-read under the claim: the record handed in may be stale.
        let current = self
            .store
            .get_job(&job.id)
            .await
            .map_err(ReconcileError::JobLookup)?
            .ok_or(ReconcileError::JobMissing)?;

        if current.notified {
            return Ok(Disposition::AlreadyNotified);
        }
        if current.status != self.completion_status {
            tracing::debug!(job_id = %job.id, status = %current.status, "Job no longer completed");
            return Ok(Disposition::NotEligible);
        }

        // 1. Owner lookup.
        let user = self
            .store
            .get_user(&current.user_id)
            .await
            .map_err(ReconcileError::UserLookup)?
            .ok_or_else(|| ReconcileError::UserNotFound {
                user_id: current.user_id.clone(),
            })?;

        let to = user
            .deliverable_email()
            .ok_or_else(|| ReconcileError::MissingEmail {
                user_id: current.user_id.clone(),
            })?;

        // 2. Format.
        if to.parse::<lettre::Address>().is_err() {
            return Err(ReconcileError::InvalidRecipient {
                address: to.to_string(),
            });
        }
        let rendered = completion_email::render(&current, &self.template);
        let message = OutboundEmail {
            from: self.from_address.clone(),
            to: to.to_string(),
            subject: rendered.subject,
            html: rendered.html,
            text: rendered.text,
        };

        // 3. Deliver.
        self.gateway
            .send(&message)
            .await
            .map_err(ReconcileError::Delivery)?;

        // 4. Record. A failure here means the next pass will send again.
        match self
            .store
            .mark_notified(&current.id)
            .await
            .map_err(ReconcileError::WriteBack)?
        {
            MarkNotified::Marked => {
                tracing::info!(job_id = %current.id, to = %message.to, "Completion email delivered");
            }
            MarkNotified::AlreadyNotified => {
                tracing::warn!(
                    job_id = %current.id,
                    "Notified marker was set concurrently, completion email may be duplicated"
                );
            }
            MarkNotified::NotFound => {
                tracing::warn!(job_id = %current.id, "Job deleted after completion email was sent");
            }
        }

        Ok(Disposition::Sent)
    }
}
