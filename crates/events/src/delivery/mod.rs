//! Outbound delivery seam for completion emails.
//!
//! The reconciler only sees [`DeliveryGateway`]; [`email::SmtpGateway`] is
//! the production implementation.

pub mod email;

use async_trait::async_trait;

/// A fully addressed, rendered message.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Error type for delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// SMTP-level failure.
    #[error(transparent)]
    Email(#[from] email::EmailError),

    /// The gateway refused the message for any other reason.
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// Sends a message and reports whether it was accepted.
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    async fn send(&self, message: &OutboundEmail) -> Result<(), DeliveryError>;
}
