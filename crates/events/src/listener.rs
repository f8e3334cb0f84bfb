//! Change-feed trigger.
//!
//! [`ChangeFeedListener`] subscribes to the job store with the reconciler's
//! completion filter and reconciles every job that is added to, or modified
//! within, the result set. It shares the reconciler (and therefore the dedup
//! guard) with the sweep, so a job seen on both paths is emailed once.

use std::sync::Arc;

use futures::StreamExt;
use printsuit_db::{ChangeFeed, JobChange, StoreError};
use tokio_util::sync::CancellationToken;

use crate::backoff::{next_delay, BackoffConfig};
use crate::outcome::{Disposition, ReconcileOutcome};
use crate::reconciler::CompletionReconciler;

pub struct ChangeFeedListener {
    reconciler: Arc<CompletionReconciler>,
    concurrency: usize,
    backoff: BackoffConfig,
}

impl ChangeFeedListener {
    /// `concurrency` caps how many changes are reconciled at once; `0`
    /// means unbounded.
    pub fn new(reconciler: Arc<CompletionReconciler>, concurrency: usize) -> Self {
        Self {
            reconciler,
            concurrency,
            backoff: BackoffConfig::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Subscribe and process changes until `cancel` is triggered.
    ///
    /// When the subscription fails or the feed ends, subscribes again after
    /// an exponentially growing delay.
    pub async fn run(&self, cancel: CancellationToken) {
        let filter = self.reconciler.completion_filter();
        let mut delay = self.backoff.initial_delay;

        loop {
            match self.reconciler.store().subscribe(&filter).await {
                Ok(feed) => {
                    tracing::info!(status = %filter.status, "Change feed subscribed");
                    delay = self.backoff.initial_delay;
                    self.consume(feed, &cancel).await;
                    if cancel.is_cancelled() {
                        break;
                    }
                    tracing::warn!("Change feed ended, resubscribing");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Change feed subscription failed"
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = next_delay(delay, &self.backoff);
        }

        tracing::info!("Change feed listener stopped");
    }

    /// Drain `feed` until it ends or `cancel` fires.
    ///
    /// Cancellation stops pulling new changes; changes already being
    /// reconciled finish first.
    pub async fn consume(&self, feed: ChangeFeed, cancel: &CancellationToken) {
        let stop = cancel.clone();
        feed.take_until(async move { stop.cancelled().await })
            .for_each_concurrent(self.concurrency, |item| async move {
                self.handle(item).await;
            })
            .await;
    }

    /// Handle one feed item. Errors are logged and swallowed.
    pub async fn handle(&self, item: Result<JobChange, StoreError>) -> Option<ReconcileOutcome> {
        let change = match item {
            Ok(change) => change,
            Err(e) => {
                tracing::warn!(error = %e, "Change feed delivered an error");
                return None;
            }
        };

        tracing::debug!(job_id = change.job_id(), kind = ?change.kind(), "Job change received");

        let job = match change {
            JobChange::Added(job) | JobChange::Modified(job) => job,
            JobChange::Removed(_) => return None,
        };

        let outcome = self.reconciler.reconcile(&job).await;
        if let Disposition::Sent = outcome.disposition {
            tracing::debug!(job_id = %outcome.job_id, "Change feed triggered completion email");
        }
        Some(outcome)
    }
}
