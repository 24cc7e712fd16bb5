//! HTTP API transport
//!
//! Posts each email as JSON to a provider endpoint (Resend, Postmark-style
//! relays, internal mail gateways, ...) with a bearer API key.

use crate::error::{MailError, Result};
use crate::registry::TransportConfig;
use crate::traits::transport::{Email, Receipt, Transport};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::time::Duration;
use url::Url;

/// Default timeout for mail API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON body sent to the provider
#[derive(Debug, Serialize)]
struct ApiPayload<'a> {
    from: &'a str,
    to: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    cc: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    bcc: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

fn is_empty(list: &&[String]) -> bool {
    list.is_empty()
}

impl<'a> From<&'a Email> for ApiPayload<'a> {
    fn from(email: &'a Email) -> Self {
        Self {
            from: &email.from,
            to: &email.to,
            cc: &email.cc,
            bcc: &email.bcc,
            reply_to: email.reply_to.as_deref(),
            subject: &email.subject,
            text: email.text.as_deref(),
            html: email.html.as_deref(),
        }
    }
}

/// Provider response; only the message id is used
#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default, alias = "message_id", alias = "MessageID")]
    id: Option<String>,
}

/// Transport that delivers through an HTTP mail API
#[derive(Clone)]
pub struct ApiTransport {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl ApiTransport {
    /// Create an API transport for `endpoint`
    pub fn new(endpoint: Url, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("tideway-mail")
            .build()
            .map_err(|e| MailError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        let endpoint = Url::parse(config.require_str("endpoint")?).map_err(|e| {
            MailError::config(format!(
                "Transport '{}' has an invalid endpoint: {}",
                config.name(),
                e
            ))
        })?;

        let timeout = config
            .int_param("timeout_secs")
            .and_then(|secs| u64::try_from(secs).ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Self::new(endpoint, config.require_str("api_key")?, timeout)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for ApiTransport {
    async fn send(&self, email: &Email) -> Result<Receipt> {
        email.validate()?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&ApiPayload::from(email))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                target: "tideway_mail::transport::api",
                endpoint = %self.endpoint,
                status = status.as_u16(),
                "Mail API rejected message"
            );
            return Err(MailError::send(format!(
                "Mail API returned {}: {}",
                status,
                body.trim()
            )));
        }

        // Providers differ in what they return; a missing or odd body still counts as sent
        let parsed: ApiResponse = response.json().await.unwrap_or_default();

        let receipt = Receipt::for_email(email);
        Ok(match parsed.id {
            Some(id) => receipt.with_message_id(id),
            None => receipt,
        })
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// Keep the API key out of debug output
impl std::fmt::Debug for ApiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
