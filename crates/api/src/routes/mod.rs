//! HTTP routes.
//!
//! ```text
//! /health                 service and store health
//! /check-completed-jobs   on-demand completion pass
//! ```

pub mod health;
pub mod jobs;
