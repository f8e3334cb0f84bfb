//! Integration tests for the scheduled completion sweep.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{completed_job, eventually, harness, user};
use printsuit_core::job::PrintJob;
use printsuit_core::status;
use printsuit_events::{SweepReport, SweepScheduler};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn pass_reconciles_only_unnotified_completed_jobs() {
    let h = harness();
    h.store.insert_user(user("U1", Some("a@x.com"))).await;
    h.store.upsert_job(completed_job("J1", "U1")).await;
    h.store.upsert_job(PrintJob::new("J2", "U1", status::PENDING)).await;
    let mut done = completed_job("J3", "U1");
    done.notified = true;
    h.store.upsert_job(done).await;

    let sweep = SweepScheduler::new(h.reconciler.clone(), Duration::from_secs(300));
    let report = sweep.run_pass().await;

    assert_matches!(report, SweepReport::Completed(ref outcomes) if outcomes.len() == 1);
    if let SweepReport::Completed(outcomes) = report {
        assert_eq!(outcomes[0].job_id, "J1");
        assert!(outcomes[0].is_sent());
    }
    assert_eq!(h.gateway.sent_count(), 1);
    assert!(!h.store.job("J2").await.unwrap().notified);
}

#[tokio::test]
async fn unhealthy_store_skips_the_pass_then_recovers() {
    let h = harness();
    h.store.insert_user(user("U1", Some("a@x.com"))).await;
    h.store.upsert_job(completed_job("J1", "U1")).await;
    h.store.upsert_job(completed_job("J2", "U1")).await;

    let sweep = SweepScheduler::new(h.reconciler.clone(), Duration::from_secs(300));

    h.store.set_offline(true);
    assert_matches!(sweep.run_pass().await, SweepReport::Skipped);
    assert_eq!(h.gateway.attempts(), 0);

    h.store.set_offline(false);
    let report = sweep.run_pass().await;
    assert_matches!(report, SweepReport::Completed(ref outcomes) if outcomes.len() == 2);
    assert_eq!(h.gateway.sent_count(), 2);
}

#[tokio::test]
async fn failing_job_is_reported_alongside_successes() {
    let h = harness();
    for i in 1..=4 {
        let uid = format!("U{i}");
        h.store
            .insert_user(user(&uid, Some(&format!("user{i}@x.com"))))
            .await;
        h.store.upsert_job(completed_job(&format!("J{i}"), &uid)).await;
    }
    h.gateway.fail_recipient("user2@x.com");

    let sweep = SweepScheduler::new(h.reconciler.clone(), Duration::from_secs(300));
    let SweepReport::Completed(outcomes) = sweep.run_pass().await else {
        panic!("expected a completed sweep");
    };

    assert_eq!(outcomes.len(), 4);
    let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_success()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].job_id, "J2");

    // The failed job stays in the backlog for the next pass.
    let SweepReport::Completed(retry) = sweep.run_pass().await else {
        panic!("expected a completed sweep");
    };
    assert_eq!(retry.len(), 1);
    assert_eq!(retry[0].job_id, "J2");
}

#[tokio::test]
async fn empty_backlog_completes_with_no_outcomes() {
    let h = harness();
    let sweep = SweepScheduler::new(h.reconciler.clone(), Duration::from_secs(300));
    assert_matches!(sweep.run_pass().await, SweepReport::Completed(ref o) if o.is_empty());
}

#[tokio::test]
async fn run_performs_a_startup_pass_and_stops_on_cancel() {
    let h = harness();
    h.store.insert_user(user("U1", Some("a@x.com"))).await;
    h.store.upsert_job(completed_job("J1", "U1")).await;

    // Long interval: only the immediate startup tick can deliver.
    let sweep = Arc::new(SweepScheduler::new(
        h.reconciler.clone(),
        Duration::from_secs(3600),
    ));
    let cancel = CancellationToken::new();
    let task = tokio::spawn({
        let sweep = Arc::clone(&sweep);
        let cancel = cancel.clone();
        async move { sweep.run(cancel).await }
    });

    let gateway = h.gateway.clone();
    assert!(
        eventually(|| {
            let gateway = gateway.clone();
            async move { gateway.sent_count() == 1 }
        })
        .await
    );

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("sweep should stop after cancellation")
        .expect("sweep task should not panic");
}
