//! Shared fixtures for notification engine integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use printsuit_core::job::PrintJob;
use printsuit_core::status;
use printsuit_core::user::User;
use printsuit_db::MemoryJobStore;
use printsuit_events::{
    CompletionReconciler, DeliveryError, DeliveryGateway, NotifierConfig, OutboundEmail,
};

// ---------------------------------------------------------------------------
// Gateway double
// ---------------------------------------------------------------------------

/// Records every accepted message; can be told to fail.
#[derive(Default)]
pub struct TestGateway {
    sent: Mutex<Vec<OutboundEmail>>,
    attempts: AtomicUsize,
    fail_next: AtomicUsize,
    failing_recipients: Mutex<HashSet<String>>,
}

impl TestGateway {
    /// Fail the next `n` sends, whatever their recipient.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Always fail sends to `address`.
    pub fn fail_recipient(&self, address: &str) {
        self.failing_recipients
            .lock()
            .unwrap()
            .insert(address.to_string());
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryGateway for TestGateway {
    async fn send(&self, message: &OutboundEmail) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let scheduled_failure = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scheduled_failure {
            return Err(DeliveryError::Rejected("scheduled failure".into()));
        }
        if self.failing_recipients.lock().unwrap().contains(&message.to) {
            return Err(DeliveryError::Rejected(format!("{} bounced", message.to)));
        }

        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryJobStore>,
    pub gateway: Arc<TestGateway>,
    pub reconciler: Arc<CompletionReconciler>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryJobStore::new());
    let gateway = Arc::new(TestGateway::default());
    let reconciler = Arc::new(CompletionReconciler::new(
        store.clone(),
        gateway.clone(),
        &NotifierConfig::default(),
    ));
    Harness {
        store,
        gateway,
        reconciler,
    }
}

pub fn user(id: &str, email: Option<&str>) -> User {
    User {
        id: id.to_string(),
        email: email.map(String::from),
        name: Some(format!("User {id}")),
        role: "user".to_string(),
    }
}

pub fn completed_job(id: &str, user_id: &str) -> PrintJob {
    PrintJob::new(id, user_id, status::COMPLETED)
}

/// Poll `check` every 10ms until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
