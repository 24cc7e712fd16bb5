//! Application-facing mailer
//!
//! Wraps a [`TransportManager`] and applies the global "from" and "to"
//! addresses from configuration before handing messages to a transport.

use crate::config::{Address, MailConfig};
use crate::error::Result;
use crate::manager::TransportManager;
use crate::traits::transport::{Email, Receipt};
use std::sync::Arc;

/// Sends email through the manager's transports
///
/// # Example
///
/// ```rust,ignore
/// use tideway_mail::{Email, MailConfig, Mailer};
///
/// let config = MailConfig::from_file("mail.toml")?;
/// let mailer = Mailer::from_config(&config)?;
///
/// // Uses the configured "from" address and the default transport
/// mailer
///     .send(Email::without_sender("user@example.com", "Welcome").text("Hello!"))
///     .await?;
/// ```
#[derive(Clone, Debug)]
pub struct Mailer {
    transports: Arc<TransportManager>,
    always_from: Option<Address>,
    always_to: Option<Address>,
}

impl Mailer {
    pub fn new(transports: Arc<TransportManager>) -> Self {
        Self {
            transports,
            always_from: None,
            always_to: None,
        }
    }

    /// Build a mailer and its transport manager from configuration
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let transports = Arc::new(TransportManager::from_config(config)?);
        Ok(Self::with_manager(transports, config))
    }

    /// Build a mailer over an existing manager, taking addresses from `config`
    pub fn with_manager(transports: Arc<TransportManager>, config: &MailConfig) -> Self {
        let mut mailer = Self::new(transports);
        mailer.always_from = config.from.clone();
        mailer.always_to = config.to.clone();
        mailer
    }

    /// Sender used for emails that have none
    pub fn always_from(mut self, address: Address) -> Self {
        self.always_from = Some(address);
        self
    }

    /// Deliver every email to `address` instead of its recipients
    pub fn always_to(mut self, address: Address) -> Self {
        self.always_to = Some(address);
        self
    }

    pub fn transports(&self) -> &Arc<TransportManager> {
        &self.transports
    }

    /// Send through the current default transport
    pub async fn send(&self, email: Email) -> Result<Receipt> {
        let transport = self.transports.get_default()?;
        transport.send(&self.prepare(email)).await
    }

    /// Send through the transport configured under `name`
    pub async fn send_via(&self, name: &str, email: Email) -> Result<Receipt> {
        let transport = self.transports.get(name)?;
        transport.send(&self.prepare(email)).await
    }

    fn prepare(&self, mut email: Email) -> Email {
        if email.from.is_empty() {
            if let Some(from) = &self.always_from {
                email.from = from.to_string();
            }
        }

        if let Some(to) = &self.always_to {
            tracing::debug!(
                target: "tideway_mail::mailer",
                original_recipients = email.recipient_count(),
                to = %to,
                "Redirecting email to catch-all address"
            );
            email.to = vec![to.to_string()];
            email.cc.clear();
            email.bcc.clear();
        }

        email
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfigBuilder;
    use crate::error::MailError;
    use crate::registry::RawTransportConfig;
    use crate::transport::MemoryTransport;

    fn config() -> MailConfig {
        MailConfigBuilder::new()
            .with_default("outbox")
            .with_transport("outbox", RawTransportConfig::new("memory"))
            .with_transport("archive", RawTransportConfig::new("memory"))
            .with_from(Address::new("noreply@example.com").with_name("Example"))
            .build()
            .unwrap()
    }

    fn sent(mailer: &Mailer, name: &str) -> Vec<Email> {
        let handle = mailer.transports().get(name).unwrap();
        handle.downcast_ref::<MemoryTransport>().unwrap().sent()
    }

    #[tokio::test]
    async fn test_send_fills_missing_sender() {
        let mailer = Mailer::from_config(&config()).unwrap();

        mailer
            .send(Email::without_sender("user@example.com", "Welcome").text("Hi"))
            .await
            .unwrap();
        mailer
            .send(Email::new("billing@example.com", "user@example.com", "Invoice").text("Due"))
            .await
            .unwrap();

        let sent = sent(&mailer, "outbox");
        assert_eq!(sent[0].from, "Example <noreply@example.com>");
        assert_eq!(sent[1].from, "billing@example.com");
    }

    #[tokio::test]
    async fn test_always_to_replaces_recipients() {
        let mailer = Mailer::from_config(&config())
            .unwrap()
            .always_to(Address::new("qa@example.com"));

        let receipt = mailer
            .send(
                Email::without_sender("a@example.com", "Report")
                    .to("b@example.com")
                    .cc("c@example.com")
                    .bcc("d@example.com")
                    .text("Numbers"),
            )
            .await
            .unwrap();

        assert_eq!(receipt.recipients, 1);
        let email = &sent(&mailer, "outbox")[0];
        assert_eq!(email.to, vec!["qa@example.com".to_string()]);
        assert!(email.cc.is_empty());
        assert!(email.bcc.is_empty());
    }

    #[tokio::test]
    async fn test_send_follows_default_switch() {
        let mailer = Mailer::from_config(&config()).unwrap();
        mailer.transports().set_default("archive").unwrap();

        mailer
            .send(Email::without_sender("user@example.com", "Hi").text("Hi"))
            .await
            .unwrap();

        assert!(sent(&mailer, "outbox").is_empty());
        assert_eq!(sent(&mailer, "archive").len(), 1);
    }

    #[tokio::test]
    async fn test_send_via_unknown_transport() {
        let mailer = Mailer::from_config(&config()).unwrap();
        let err = mailer
            .send_via("carrier-pigeon", Email::without_sender("u@example.com", "Hi").text("Hi"))
            .await
            .unwrap_err();

        assert!(matches!(err.build_cause(), Some(MailError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_sender_without_always_from_is_rejected() {
        let transports = Arc::new(TransportManager::from_config(&config()).unwrap());
        let mailer = Mailer::new(transports);

        let err = mailer
            .send(Email::without_sender("u@example.com", "Hi").text("Hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::InvalidMessage(_)));
    }
}
