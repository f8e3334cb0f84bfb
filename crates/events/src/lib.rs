//! PrintSuit completion notification engine.
//!
//! - [`CompletionReconciler`]: the single state transition that decides
//!   whether a completed job still owes an email, sends it and records the
//!   dedup marker.
//! - [`SweepScheduler`]: periodic (and startup) pass over the backlog.
//! - [`ChangeFeedListener`]: incremental trigger driven by the store's
//!   change feed.
//! - [`delivery`]: the outbound gateway seam and its SMTP implementation.
//!
//! Every trigger path goes through [`CompletionReconciler::reconcile`].

pub mod backoff;
pub mod config;
pub mod delivery;
pub mod in_flight;
pub mod listener;
pub mod outcome;
pub mod reconciler;
pub mod sweep;

pub use config::NotifierConfig;
pub use delivery::email::{EmailConfig, SmtpGateway};
pub use delivery::{DeliveryError, DeliveryGateway, OutboundEmail};
pub use listener::ChangeFeedListener;
pub use outcome::{Disposition, FailureStage, PassSummary, ReconcileError, ReconcileOutcome};
pub use reconciler::CompletionReconciler;
pub use sweep::{SweepReport, SweepScheduler};
