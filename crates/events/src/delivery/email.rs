//! Email delivery via SMTP.
//!
//! [`SmtpGateway`] wraps the `lettre` async SMTP transport and sends each
//! [`OutboundEmail`] as `multipart/alternative` (plain text + HTML). The
//! transport is built once from [`EmailConfig`]; if `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None` and no gateway can be built.

use async_trait::async_trait;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{DeliveryError, DeliveryGateway, OutboundEmail};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for SMTP delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP transport settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable         | Required | Default |
    /// |------------------|----------|---------|
    /// | `SMTP_HOST`      | yes      | none    |
    /// | `SMTP_PORT`      | no       | `587`   |
    /// | `SMTP_USER`      | no       | none    |
    /// | `SMTP_PASSWORD`  | no       | none    |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// SmtpGateway
// ---------------------------------------------------------------------------

/// [`DeliveryGateway`] backed by an SMTP relay.
pub struct SmtpGateway {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpGateway {
    /// Build the relay transport. No connection is opened until the first
    /// send.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
        })
    }
}

/// Assemble the MIME message for `email`.
fn build_message(email: &OutboundEmail) -> Result<Message, EmailError> {
    Message::builder()
        .from(email.from.parse()?)
        .to(email.to.parse()?)
        .subject(email.subject.as_str())
        .multipart(MultiPart::alternative_plain_html(
            email.text.clone(),
            email.html.clone(),
        ))
        .map_err(|e| EmailError::Build(e.to_string()))
}

#[async_trait]
impl DeliveryGateway for SmtpGateway {
    async fn send(&self, email: &OutboundEmail) -> Result<(), DeliveryError> {
        let message = build_message(email)?;
        self.mailer.send(message).await.map_err(EmailError::from)?;

        tracing::info!(to = %email.to, subject = %email.subject, "Completion email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str) -> OutboundEmail {
        OutboundEmail {
            from: "noreply@printsuit.local".into(),
            to: to.into(),
            subject: "Done".into(),
            html: "<p>done</p>".into(),
            text: "done".into(),
        }
    }

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        std::env::remove_var("SMTP_HOST");
        assert!(EmailConfig::from_env().is_none());
    }

    #[test]
    fn message_is_multipart_alternative() {
        let message = build_message(&email("a@x.com")).expect("valid message");
        let raw = String::from_utf8(message.formatted()).expect("utf-8 message");
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/html"));
        assert!(raw.contains("text/plain"));
    }

    #[test]
    fn invalid_recipient_is_an_address_error() {
        let err = build_message(&email("not-an-email")).unwrap_err();
        assert!(matches!(err, EmailError::Address(_)));
        assert!(err.to_string().contains("Email address parse error"));
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
