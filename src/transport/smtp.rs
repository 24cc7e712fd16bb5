//! SMTP transport using lettre
//!
//! Sends emails via an SMTP relay. Building the transport only prepares the
//! connection pool; no connection is opened until the first send.

use super::message::build_message;
use crate::error::{MailError, Result};
use crate::registry::TransportConfig;
use crate::traits::transport::{Email, Receipt, Transport};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    transport::smtp::authentication::Credentials,
};
use std::any::Any;
use std::time::Duration;

/// How the SMTP connection is secured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpEncryption {
    /// Upgrade a plain connection with STARTTLS (default)
    StartTls,
    /// Implicit TLS from the first byte (usually port 465)
    Tls,
    /// No encryption (local relays and test servers only)
    None,
}

/// SMTP settings read from a `smtp` transport configuration
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// SMTP server hostname
    pub host: String,
    /// SMTP server port (default: 587)
    pub port: u16,
    /// Username for authentication
    pub username: Option<String>,
    /// Password for authentication
    pub password: Option<String>,
    pub encryption: SmtpEncryption,
    /// Connection/command timeout
    pub timeout: Option<Duration>,
}

impl SmtpSettings {
    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        let host = config.require_str("host")?.to_string();

        let port = match config.int_param("port") {
            Some(port) => u16::try_from(port).map_err(|_| {
                MailError::config(format!(
                    "Transport '{}' has an invalid SMTP port: {}",
                    config.name(),
                    port
                ))
            })?,
            None => 587,
        };

        let encryption = match config
            .str_param("encryption")
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("tls") => SmtpEncryption::Tls,
            Some("none") => SmtpEncryption::None,
            _ => SmtpEncryption::StartTls,
        };

        let timeout = config
            .int_param("timeout_secs")
            .and_then(|secs| u64::try_from(secs).ok())
            .map(Duration::from_secs);

        Ok(Self {
            host,
            port,
            username: config.str_param("username").map(str::to_string),
            password: config.str_param("password").map(str::to_string),
            encryption,
            timeout,
        })
    }
}

/// SMTP transport using lettre
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    settings: SmtpSettings,
}

impl SmtpTransport {
    /// Create a new SMTP transport with the given settings
    ///
    /// The connection pool spawns a maintenance task, so this must be called
    /// from within a Tokio runtime.
    pub fn new(settings: SmtpSettings) -> Result<Self> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(MailError::internal(
                "SMTP transport must be created inside a Tokio runtime",
            ));
        }

        let mut builder = match settings.encryption {
            SmtpEncryption::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host).map_err(|e| {
                    MailError::internal(format!("Failed to create SMTP transport: {}", e))
                })?
            }
            SmtpEncryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .map_err(|e| MailError::internal(format!("Failed to create SMTP transport: {}", e)))?,
            SmtpEncryption::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            }
        };

        builder = builder.port(settings.port).timeout(settings.timeout);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            settings,
        })
    }

    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        Self::new(SmtpSettings::from_config(config)?)
    }

    pub fn settings(&self) -> &SmtpSettings {
        &self.settings
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, email: &Email) -> Result<Receipt> {
        email.validate()?;

        let message = build_message(email)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| MailError::send(format!("SMTP delivery failed: {}", e)))?;

        tracing::debug!(
            target: "tideway_mail::transport::smtp",
            host = %self.settings.host,
            code = %response.code(),
            "SMTP server accepted message"
        );

        Ok(Receipt::for_email(email))
    }

    fn is_healthy(&self) -> bool {
        // Connectivity is only known after a send; lettre reconnects on demand
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// Implement Debug manually since AsyncSmtpTransport doesn't impl Debug
impl std::fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpTransport")
            .field("host", &self.settings.host)
            .field("port", &self.settings.port)
            .field("encryption", &self.settings.encryption)
            .finish()
    }
}
