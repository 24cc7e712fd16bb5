//! Transport trait for delivering emails
//!
//! This trait abstracts the delivery channel, so the same application code can
//! send through SMTP, a local sendmail binary, an HTTP API provider, or a log
//! sink depending on which named transport is selected.

use crate::error::{MailError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::any::Any;

/// An email message to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// Sender email address (e.g., "noreply@example.com")
    pub from: String,
    /// Recipient email addresses
    pub to: Vec<String>,
    /// CC recipients
    pub cc: Vec<String>,
    /// BCC recipients
    pub bcc: Vec<String>,
    /// Email subject line
    pub subject: String,
    /// Plain text body (optional if html is provided)
    pub text: Option<String>,
    /// HTML body (optional if text is provided)
    pub html: Option<String>,
    /// Reply-to address (optional)
    pub reply_to: Option<String>,
}

impl Email {
    /// Create a new email with the required fields
    pub fn new(from: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: vec![to.into()],
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: subject.into(),
            text: None,
            html: None,
            reply_to: None,
        }
    }

    /// Create an email without a sender
    ///
    /// The [`Mailer`](crate::Mailer) fills in its configured "from" address.
    pub fn without_sender(to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self::new(String::new(), to, subject)
    }

    /// Add a recipient
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Add multiple recipients
    pub fn to_many(mut self, recipients: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.to.extend(recipients.into_iter().map(|r| r.into()));
        self
    }

    /// Add a CC recipient
    pub fn cc(mut self, recipient: impl Into<String>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Add a BCC recipient
    pub fn bcc(mut self, recipient: impl Into<String>) -> Self {
        self.bcc.push(recipient.into());
        self
    }

    /// Set the plain text body
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text = Some(body.into());
        self
    }

    /// Set the HTML body
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html = Some(body.into());
        self
    }

    /// Set the reply-to address
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Total number of recipients across to, cc and bcc
    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }

    /// Validate the email has required fields
    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() {
            return Err(MailError::invalid_message("Email 'from' is required"));
        }
        if self.to.is_empty() {
            return Err(MailError::invalid_message("Email 'to' is required"));
        }
        if self.subject.is_empty() {
            return Err(MailError::invalid_message("Email 'subject' is required"));
        }
        if self.text.is_none() && self.html.is_none() {
            return Err(MailError::invalid_message(
                "Email must have either 'text' or 'html' body",
            ));
        }
        Ok(())
    }
}

/// Outcome of a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Provider message id, or a generated UUID when the transport has none
    pub message_id: String,
    /// Number of recipients the message was handed over for
    pub recipients: usize,
    pub sent_at: DateTime<Utc>,
}

impl Receipt {
    /// Receipt for `email` with a freshly generated message id
    pub fn for_email(email: &Email) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            recipients: email.recipient_count(),
            sent_at: Utc::now(),
        }
    }

    /// Replace the generated id with one assigned by the provider
    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = id.into();
        self
    }
}

/// Transport trait for delivering emails
///
/// Implement this trait (and register a builder with
/// [`TransportManager::with_builder`](crate::TransportManager::with_builder))
/// to plug in a custom delivery channel.
///
/// # Example
///
/// ```rust,ignore
/// use tideway_mail::traits::transport::{Email, Receipt, Transport};
/// use tideway_mail::Result;
/// use async_trait::async_trait;
/// use std::any::Any;
///
/// struct MyTransport;
///
/// #[async_trait]
/// impl Transport for MyTransport {
///     async fn send(&self, email: &Email) -> Result<Receipt> {
///         email.validate()?;
///         // Deliver via your preferred service
///         Ok(Receipt::for_email(email))
///     }
///
///     fn is_healthy(&self) -> bool {
///         true
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send an email
    ///
    /// Returns a [`Receipt`] if the transport accepted the message.
    async fn send(&self, email: &Email) -> Result<Receipt>;

    /// Check if the transport is healthy/connected
    fn is_healthy(&self) -> bool;

    /// Get a reference to this transport as `Any` for downcasting
    fn as_any(&self) -> &dyn Any;
}
