//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use printsuit_core::user::User;
use printsuit_db::MemoryJobStore;
use printsuit_events::{
    CompletionReconciler, DeliveryError, DeliveryGateway, NotifierConfig, OutboundEmail,
};
use tower::ServiceExt;

use printsuit_api::config::ServerConfig;
use printsuit_api::router::build_app_router;
use printsuit_api::state::AppState;

/// Build a test `ServerConfig` with the dev CORS origin.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
    }
}

/// Gateway double that records messages and can fail the next `n` sends.
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<OutboundEmail>>,
    fail_next: AtomicUsize,
}

impl RecordingGateway {
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryGateway for RecordingGateway {
    async fn send(&self, message: &OutboundEmail) -> Result<(), DeliveryError> {
        if self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(DeliveryError::Rejected("smtp unavailable".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryJobStore>,
    pub gateway: Arc<RecordingGateway>,
}

/// Build the full application router over an in-memory store, with the
/// same middleware stack as production.
pub fn build_test_app() -> TestApp {
    let store = Arc::new(MemoryJobStore::new());
    let gateway = Arc::new(RecordingGateway::default());
    let reconciler = Arc::new(CompletionReconciler::new(
        store.clone(),
        gateway.clone(),
        &NotifierConfig::default(),
    ));

    let config = test_config();
    let state = AppState {
        store: store.clone(),
        reconciler,
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        gateway,
    }
}

pub fn user(id: &str, email: Option<&str>) -> User {
    User {
        id: id.to_string(),
        email: email.map(String::from),
        name: Some("Asha".to_string()),
        role: "user".to_string(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
