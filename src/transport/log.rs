//! Log transport for development
//!
//! Writes emails to the tracing log instead of sending them.
//!
//! # Security Warning
//!
//! Log output is usually collected by logging systems. Body content is
//! redacted unless `full_output = true` is set on the transport, and even then
//! this transport should not be used in production: email content may contain
//! sensitive information (tokens, PII, etc.).

use crate::error::Result;
use crate::registry::TransportConfig;
use crate::traits::transport::{Email, Receipt, Transport};
use async_trait::async_trait;
use std::any::Any;
use tracing::Level;

macro_rules! emit {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::error!(target: "tideway_mail::transport::log", $($arg)+)
        } else if level == Level::WARN {
            tracing::warn!(target: "tideway_mail::transport::log", $($arg)+)
        } else if level == Level::DEBUG {
            tracing::debug!(target: "tideway_mail::transport::log", $($arg)+)
        } else if level == Level::TRACE {
            tracing::trace!(target: "tideway_mail::transport::log", $($arg)+)
        } else {
            tracing::info!(target: "tideway_mail::transport::log", $($arg)+)
        }
    }};
}

/// A transport that logs emails instead of sending them
///
/// By default, email body content is redacted. Use `with_full_output(true)`
/// to see full content in development.
///
/// # Example
///
/// ```rust,ignore
/// use tideway_mail::transport::LogTransport;
/// use tideway_mail::traits::transport::{Email, Transport};
///
/// let transport = LogTransport::new();
/// let email = Email::new("from@example.com", "to@example.com", "Test").text("Hello!");
///
/// transport.send(&email).await?; // Logged at INFO
/// ```
#[derive(Debug, Clone)]
pub struct LogTransport {
    level: Level,
    /// Whether to show full email content (default: false)
    show_full_content: bool,
}

impl LogTransport {
    /// Create a log transport writing at INFO with redacted bodies
    pub fn new() -> Self {
        Self {
            level: Level::INFO,
            show_full_content: false,
        }
    }

    /// Set the level messages are logged at
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Enable or disable full email content output
    ///
    /// Default: `false` (body content is redacted)
    pub fn with_full_output(mut self, enabled: bool) -> Self {
        if enabled {
            tracing::warn!(
                target: "tideway_mail::transport::log",
                "LogTransport: full output enabled - email content will be visible in logs. \
                 Do not use in production!"
            );
        }
        self.show_full_content = enabled;
        self
    }

    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        let level = config
            .str_param("level")
            .and_then(|level| level.parse::<Level>().ok())
            .unwrap_or(Level::INFO);

        Ok(Self::new()
            .with_level(level)
            .with_full_output(config.bool_param("full_output").unwrap_or(false)))
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for LogTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LogTransport {
    async fn send(&self, email: &Email) -> Result<Receipt> {
        email.validate()?;

        let receipt = Receipt::for_email(email);

        emit!(
            self.level,
            message_id = %receipt.message_id,
            from = %email.from,
            to = email.to.len(),
            cc = email.cc.len(),
            bcc = email.bcc.len(),
            reply_to = email.reply_to.is_some(),
            subject = %email.subject,
            "Email logged"
        );

        if self.show_full_content {
            if let Some(ref text) = email.text {
                emit!(self.level, message_id = %receipt.message_id, "[TEXT]\n{}", text);
            }
            if let Some(ref html) = email.html {
                emit!(self.level, message_id = %receipt.message_id, "[HTML]\n{}", html);
            }
        } else {
            emit!(
                self.level,
                message_id = %receipt.message_id,
                text_bytes = email.text.as_ref().map_or(0, String::len),
                html_bytes = email.html.as_ref().map_or(0, String::len),
                "Email body [REDACTED]"
            );
        }

        Ok(receipt)
    }

    fn is_healthy(&self) -> bool {
        true // Logging is always available
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
