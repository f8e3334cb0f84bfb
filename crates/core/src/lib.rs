//! Domain types and pure logic for the PrintSuit completion notifier.
//!
//! Nothing in this crate performs I/O: it holds the job and user records,
//! the shared status literals, and the completion email formatter.

pub mod completion_email;
pub mod job;
pub mod status;
pub mod types;
pub mod user;
