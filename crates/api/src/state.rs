use std::sync::Arc;

use printsuit_db::JobStore;
use printsuit_events::CompletionReconciler;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Job and user store, also used by the health probe.
    pub store: Arc<dyn JobStore>,
    /// The reconciler shared with the sweep and the change-feed listener.
    pub reconciler: Arc<CompletionReconciler>,
}
