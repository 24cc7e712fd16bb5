//! Sendmail transport
//!
//! Pipes messages into a local sendmail-compatible binary (sendmail, msmtp,
//! postfix's sendmail wrapper, ...).

use super::message::build_message;
use crate::error::{MailError, Result};
use crate::registry::TransportConfig;
use crate::traits::transport::{Email, Receipt, Transport};
use async_trait::async_trait;
use lettre::{AsyncSendmailTransport, AsyncTransport, Tokio1Executor};
use std::any::Any;

pub struct SendmailTransport {
    transport: AsyncSendmailTransport<Tokio1Executor>,
    command: String,
}

impl SendmailTransport {
    /// Create a transport that runs `command` for every message
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            transport: AsyncSendmailTransport::<Tokio1Executor>::new_with_command(command.clone()),
            command,
        }
    }

    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        Ok(Self::new(config.require_str("command")?))
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl Transport for SendmailTransport {
    async fn send(&self, email: &Email) -> Result<Receipt> {
        email.validate()?;

        let message = build_message(email)?;

        self.transport.send(message).await.map_err(|e| {
            MailError::send(format!("sendmail command '{}' failed: {}", self.command, e))
        })?;

        Ok(Receipt::for_email(email))
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for SendmailTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendmailTransport")
            .field("command", &self.command)
            .finish()
    }
}
