//! Periodic backlog sweep.
//!
//! [`SweepScheduler`] runs as a background task. The first tick of its
//! interval fires immediately, so one pass runs at startup and then one per
//! configured interval. Each pass probes store health first and is skipped
//! entirely when the store is unreachable.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::outcome::{PassSummary, ReconcileOutcome};
use crate::reconciler::CompletionReconciler;

/// Result of one scheduled pass.
#[derive(Debug)]
pub enum SweepReport {
    /// The health probe failed; nothing was attempted.
    Skipped,
    /// Listing the backlog failed after a healthy probe.
    Failed,
    /// Every candidate job was reconciled.
    Completed(Vec<ReconcileOutcome>),
}

// ---------------------------------------------------------------------------
// SweepScheduler
// ---------------------------------------------------------------------------

/// Background service that reconciles the whole backlog on a fixed interval.
pub struct SweepScheduler {
    reconciler: Arc<CompletionReconciler>,
    interval: Duration,
}

impl SweepScheduler {
    pub fn new(reconciler: Arc<CompletionReconciler>, interval: Duration) -> Self {
        Self {
            reconciler,
            interval,
        }
    }

    /// Run the sweep loop until `cancel` is triggered.
    ///
    /// A pass that has started always runs to completion; cancellation is
    /// only observed between passes.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Completion sweep started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Completion sweep stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.run_pass().await;
                }
            }
        }
    }

    /// Run a single pass over every completed job that is not yet notified.
    pub async fn run_pass(&self) -> SweepReport {
        let store = self.reconciler.store();

        if let Err(e) = store.health_check().await {
            tracing::error!(error = %e, "Store health check failed, skipping completion sweep");
            return SweepReport::Skipped;
        }

        let filter = self.reconciler.completion_filter().with_notified(false);
        let jobs = match store.list_jobs(&filter).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list completed jobs");
                return SweepReport::Failed;
            }
        };

        if jobs.is_empty() {
            tracing::debug!("Completion sweep: no jobs awaiting notification");
            return SweepReport::Completed(Vec::new());
        }

        let outcomes = self.reconciler.reconcile_all(&jobs).await;
        let summary = PassSummary::of(&outcomes);
        tracing::info!(
            total = summary.total,
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            "Completion sweep finished"
        );

        SweepReport::Completed(outcomes)
    }
}
