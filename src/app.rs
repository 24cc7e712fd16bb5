use std::sync::Arc;

use crate::config::MailConfig;
use crate::error::{MailError, Result};
use crate::mailer::Mailer;
use crate::manager::TransportManager;

/// Application context holding the shared mail services
///
/// Both services are optional so an application can run without mail
/// configured; the accessors report a missing service as an error.
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    pub mail_transports: Option<Arc<TransportManager>>,
    pub mailer: Option<Arc<Mailer>>,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern for constructing AppContext
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }

    /// Get the transport manager, returning an error if not configured
    pub fn mail_transports(&self) -> Result<&Arc<TransportManager>> {
        self.mail_transports
            .as_ref()
            .ok_or_else(|| MailError::internal("Mail transports not configured"))
    }

    /// Get the transport manager as an Option
    pub fn mail_transports_opt(&self) -> Option<&Arc<TransportManager>> {
        self.mail_transports.as_ref()
    }

    /// Get the mailer, returning an error if not configured
    pub fn mailer(&self) -> Result<&Arc<Mailer>> {
        self.mailer
            .as_ref()
            .ok_or_else(|| MailError::internal("Mailer not configured"))
    }

    /// Get the mailer as an Option
    pub fn mailer_opt(&self) -> Option<&Arc<Mailer>> {
        self.mailer.as_ref()
    }
}

/// Builder for AppContext with fluent API
#[must_use = "builder does nothing until you call build()"]
#[derive(Default)]
pub struct AppContextBuilder {
    mail_transports: Option<Arc<TransportManager>>,
    mailer: Option<Arc<Mailer>>,
}

impl AppContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transport manager
    pub fn with_transport_manager(mut self, manager: Arc<TransportManager>) -> Self {
        self.mail_transports = Some(manager);
        self
    }

    /// Set the mailer
    ///
    /// Also registers the mailer's transport manager unless one was set.
    pub fn with_mailer(mut self, mailer: Arc<Mailer>) -> Self {
        if self.mail_transports.is_none() {
            self.mail_transports = Some(Arc::clone(mailer.transports()));
        }
        self.mailer = Some(mailer);
        self
    }

    /// Build the transport manager and mailer from configuration
    ///
    /// The mailer sends through the same manager stored in the context, so a
    /// default switched on one is seen by the other.
    ///
    /// # Example
    /// ```ignore
    /// let config = MailConfig::from_file("mail.toml")?;
    /// let context = AppContext::builder()
    ///     .with_mail_config(&config)?
    ///     .build();
    /// ```
    pub fn with_mail_config(self, config: &MailConfig) -> Result<Self> {
        let manager = Arc::new(TransportManager::from_config(config)?);
        let mailer = Arc::new(Mailer::with_manager(Arc::clone(&manager), config));
        Ok(self.with_transport_manager(manager).with_mailer(mailer))
    }

    pub fn build(self) -> AppContext {
        AppContext {
            mail_transports: self.mail_transports,
            mailer: self.mailer,
        }
    }
}
