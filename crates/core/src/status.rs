//! Well-known print job lifecycle status literals.
//!
//! Every component that filters jobs by status (the sweep, the change-feed
//! listener and the on-demand endpoint) must go through these constants or
//! the configured completion status derived from them, never a local literal.

/// A submitted job waiting for fulfillment.
pub const PENDING: &str = "pending";

/// Terminal state: the job has been printed and is ready for collection.
pub const COMPLETED: &str = "completed";
