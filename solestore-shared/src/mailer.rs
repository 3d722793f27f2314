/// Outbound email construction and delivery seam
///
/// The core only builds the message that must go out — recipient, sender,
/// subject and HTML body with the embedded action link. Delivery is an
/// external concern behind the [`EmailSender`] trait; the in-tree
/// implementations log ([`LogMailer`]) or capture for tests
/// ([`MemoryMailer`]).

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Error type for email delivery
#[derive(Debug, Error)]
pub enum MailError {
    /// The sender could not accept or deliver the message
    #[error("failed to send email: {0}")]
    SendFailed(String),
}

/// Sender identity embedded in outbound mail
#[derive(Debug, Clone)]
pub struct SenderIdentity {
    /// Display name, e.g. the storefront brand
    pub name: String,

    /// Verified sender address
    pub email: String,
}

/// A fully constructed outbound message
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    /// Recipient address
    pub to: String,

    /// Sender display name
    pub from_name: String,

    /// Sender address
    pub from_email: String,

    /// Subject line
    pub subject: String,

    /// HTML body
    pub html: String,
}

/// Builds the storefront's notification messages
#[derive(Clone)]
pub struct EmailBuilder {
    sender: SenderIdentity,

    /// Service base URL used for links embedded in emails
    base_url: String,
}

impl EmailBuilder {
    /// Creates a builder with the configured sender and link base URL
    pub fn new(sender: SenderIdentity, base_url: impl Into<String>) -> Self {
        EmailBuilder {
            sender,
            base_url: base_url.into(),
        }
    }

    fn message(&self, to: &str, subject: &str, html: String) -> OutboundEmail {
        OutboundEmail {
            to: to.to_string(),
            from_name: self.sender.name.clone(),
            from_email: self.sender.email.clone(),
            subject: subject.to_string(),
            html,
        }
    }

    /// Email-verification notice with the signed verification link
    pub fn verification_email(&self, to: &str, username: &str, token: &str) -> OutboundEmail {
        let link = format!("{}/api/v1/verify-email?token={token}", self.base_url);
        let html = format!(
            "<h3>Hello {username},</h3>\
             <p>Thanks for registering. Please verify your email by following the link below:</p>\
             <a href=\"{link}\">Verify email</a>\
             <p>This link expires in 24 hours.</p>"
        );
        self.message(to, "Verify your email", html)
    }

    /// Password-reset notice with the reset link
    pub fn reset_email(&self, to: &str, token: &str) -> OutboundEmail {
        let link = format!("{}/reset-password/{token}", self.base_url);
        let html = format!(
            "<p>Reset your password <a href=\"{link}\" target=\"_blank\">here</a>.</p>\
             <p>This link expires in 1 hour.</p>"
        );
        self.message(to, "Reset password", html)
    }

    /// Order confirmation sent after checkout
    pub fn order_confirmation_email(
        &self,
        to: &str,
        recipient: &str,
        order_id: &str,
        order_total: f64,
    ) -> OutboundEmail {
        let html = format!(
            "<h3>Hello {recipient},</h3>\
             <p>Your order <b>{order_id}</b> has been received.</p>\
             <p>Order total: {order_total:.2}</p>"
        );
        self.message(to, "Order confirmation", html)
    }
}

/// Delivery seam; implementations own transport, retries and credentials
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Hands one message to the delivery channel
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

/// Sender that logs instead of delivering
///
/// Default wiring for local development; the message content is traced at
/// info level without the body.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "outbound email (log mailer)");
        Ok(())
    }
}

/// Sender that records every message for test assertions
#[derive(Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl MemoryMailer {
    /// Creates an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything sent so far
    pub async fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailSender for MemoryMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        self.sent.lock().await.push(email);
        Ok(())
    }
}
