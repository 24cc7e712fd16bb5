use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{MailError, Result};
use crate::registry::{RawTransportConfig, TransportRegistry};
use crate::utils::get_env_with_prefix;

/// An email address with an optional display name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Address {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse into a lettre mailbox, failing on a malformed address
    pub fn mailbox(&self) -> Result<Mailbox> {
        let email = self.address.parse::<lettre::Address>().map_err(|e| {
            MailError::config(format!("Invalid address '{}': {}", self.address, e))
        })?;
        let name = self.name.as_deref().map(str::trim).filter(|name| !name.is_empty());
        Ok(Mailbox::new(name.map(str::to_string), email))
    }
}

// Display names are quoted as needed, so `Doe, John` stays a single mailbox
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mailbox() {
            Ok(mailbox) => write!(f, "{}", mailbox),
            Err(_) => f.write_str(&self.address),
        }
    }
}

/// Mail configuration: named transports plus the default selection
///
/// ```toml
/// default = "primary"
///
/// [from]
/// address = "noreply@example.com"
/// name = "Example"
///
/// [transports.primary]
/// driver = "smtp"
/// host = "smtp.example.com"
///
/// [transports.audit]
/// driver = "log"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MailConfig {
    /// Name of the transport used when none is requested
    pub default: String,
    /// Sender applied to emails that have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Catch-all recipient replacing every recipient (staging/QA)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default)]
    pub transports: BTreeMap<String, RawTransportConfig>,
}

impl MailConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MailError::config(format!(
                "Failed to read mail configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check the default name and the global addresses
    ///
    /// Fails if the default is empty or names no transport, or if the "from"
    /// or "to" address does not parse. Per-driver fields are checked when the
    /// registry is loaded.
    pub fn validate(&self) -> Result<()> {
        if self.default.trim().is_empty() {
            return Err(MailError::config("No default mail transport configured"));
        }

        if !self.transports.contains_key(&self.default) {
            return Err(MailError::config(format!(
                "Default mail transport '{}' is not configured",
                self.default
            )));
        }

        for (field, address) in [("from", &self.from), ("to", &self.to)] {
            if let Some(address) = address {
                if let Err(e) = address.address.parse::<lettre::Address>() {
                    return Err(MailError::config(format!(
                        "Invalid '{}' address '{}': {}",
                        field, address.address, e
                    )));
                }
            }
        }

        Ok(())
    }

    /// Build the transport registry described by this configuration
    pub fn registry(&self) -> Result<TransportRegistry> {
        TransportRegistry::load(self.transports.clone())
    }
}

/// Builder for MailConfig with file, environment and programmatic sources
///
/// Later calls override earlier ones, so the usual order is
/// `from_file` → `from_env` → explicit `with_*` calls.
#[must_use = "builder does nothing until you call build()"]
#[derive(Debug, Default)]
pub struct MailConfigBuilder {
    default: Option<String>,
    from: Option<Address>,
    to: Option<Address>,
    transports: Vec<(String, RawTransportConfig)>,
}

impl MailConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(mut self, config: MailConfig) -> Self {
        self.default = Some(config.default);
        if config.from.is_some() {
            self.from = config.from;
        }
        if config.to.is_some() {
            self.to = config.to;
        }
        self.transports.extend(config.transports);
        self
    }

    /// Merge a TOML file into the builder
    pub fn from_file(self, path: impl AsRef<Path>) -> Result<Self> {
        Ok(self.from_config(MailConfig::from_file(path)?))
    }

    /// Override settings from environment variables
    ///
    /// Each variable is looked up with the `TIDEWAY_` prefix first:
    /// - `MAIL_DEFAULT`
    /// - `MAIL_FROM_ADDRESS`, `MAIL_FROM_NAME`
    /// - `MAIL_TO_ADDRESS`, `MAIL_TO_NAME`
    pub fn from_env(mut self) -> Self {
        if let Some(default) = get_env_with_prefix("MAIL_DEFAULT") {
            self.default = Some(default);
        }
        if let Some(address) = get_env_with_prefix("MAIL_FROM_ADDRESS") {
            let mut from = Address::new(address);
            from.name = get_env_with_prefix("MAIL_FROM_NAME");
            self.from = Some(from);
        }
        if let Some(address) = get_env_with_prefix("MAIL_TO_ADDRESS") {
            let mut to = Address::new(address);
            to.name = get_env_with_prefix("MAIL_TO_NAME");
            self.to = Some(to);
        }
        self
    }

    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default = Some(name.into());
        self
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Add a named transport
    pub fn with_transport(mut self, name: impl Into<String>, transport: RawTransportConfig) -> Self {
        self.transports.push((name.into(), transport));
        self
    }

    /// Validate and build the configuration
    ///
    /// Fails if a transport name was added twice, or if
    /// [`MailConfig::validate`] rejects the result.
    pub fn build(self) -> Result<MailConfig> {
        let default = self
            .default
            .ok_or_else(|| MailError::config("No default mail transport configured"))?;

        let mut transports = BTreeMap::new();
        for (name, transport) in self.transports {
            if transports.contains_key(&name) {
                return Err(MailError::config(format!(
                    "Transport '{}' is defined more than once",
                    name
                )));
            }
            transports.insert(name, transport);
        }

        let config = MailConfig {
            default,
            from: self.from,
            to: self.to,
            transports,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Driver, ParamValue};

    const EXAMPLE: &str = r#"
        default = "primary"

        [from]
        address = "noreply@example.com"
        name = "Example"

        [transports.primary]
        driver = "smtp"
        host = "smtp.example.com"
        port = 2525

        [transports.audit]
        driver = "log"
    "#;

    #[test]
    fn test_parse_toml() {
        let config = MailConfig::from_toml_str(EXAMPLE).unwrap();

        assert_eq!(config.default, "primary");
        assert_eq!(
            config.from,
            Some(Address::new("noreply@example.com").with_name("Example"))
        );
        assert!(config.to.is_none());
        assert_eq!(config.transports.len(), 2);
        assert_eq!(
            config.transports["primary"].params["port"],
            ParamValue::Integer(2525)
        );

        let registry = config.registry().unwrap();
        assert_eq!(registry.resolve("audit").unwrap().driver(), Driver::Log);
    }

    #[test]
    fn test_duplicate_transport_table_is_config_error() {
        let err = MailConfig::from_toml_str(
            r#"
            default = "primary"
            [transports.primary]
            driver = "log"
            [transports.primary]
            driver = "log"
            "#,
        )
        .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_missing_default_is_config_error() {
        assert!(MailConfig::from_toml_str("[transports.a]\ndriver = \"log\"").is_err());
    }

    #[test]
    fn test_address_display() {
        assert_eq!(Address::new("a@example.com").to_string(), "a@example.com");
        assert_eq!(
            Address::new("a@example.com").with_name("Alice").to_string(),
            "Alice <a@example.com>"
        );
    }

    #[test]
    fn test_address_display_quotes_special_names() {
        let address = Address::new("ops@example.com").with_name("Doe, John");
        let mailbox: Mailbox = address.to_string().parse().unwrap();

        assert_eq!(mailbox.name.as_deref(), Some("Doe, John"));
        assert_eq!(mailbox.email.to_string(), "ops@example.com");
    }

    #[test]
    fn test_toml_with_invalid_to_address_is_config_error() {
        let err = MailConfig::from_toml_str(
            r#"
            default = "audit"
            [to]
            address = "qa at example"
            [transports.audit]
            driver = "log"
            "#,
        )
        .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("'to'"));
    }

    #[test]
    fn test_toml_with_unknown_default_is_config_error() {
        let err = MailConfig::from_toml_str(
            "default = \"primary\"\n[transports.audit]\ndriver = \"log\"",
        )
        .unwrap_err();
        assert!(err.to_string().contains("'primary'"));
    }

    #[test]
    fn test_builder_requires_known_default() {
        let err = MailConfigBuilder::new()
            .with_default("primary")
            .with_transport("audit", RawTransportConfig::new("log"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("'primary'"));

        let err = MailConfigBuilder::new()
            .with_transport("audit", RawTransportConfig::new("log"))
            .build()
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_builder_rejects_duplicate_transport() {
        let err = MailConfigBuilder::new()
            .with_default("audit")
            .with_transport("audit", RawTransportConfig::new("log"))
            .with_transport("audit", RawTransportConfig::new("memory"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_builder_rejects_bad_from_address() {
        let err = MailConfigBuilder::new()
            .with_default("audit")
            .with_transport("audit", RawTransportConfig::new("log"))
            .with_from(Address::new("nobody"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("'from'"));
    }

    #[test]
    fn test_builder_layers_explicit_over_config() {
        let config = MailConfigBuilder::new()
            .from_config(MailConfig::from_toml_str(EXAMPLE).unwrap())
            .with_default("audit")
            .with_to(Address::new("qa@example.com"))
            .build()
            .unwrap();

        assert_eq!(config.default, "audit");
        assert_eq!(config.to, Some(Address::new("qa@example.com")));
        assert_eq!(
            config.from.as_ref().map(|a| a.address.as_str()),
            Some("noreply@example.com")
        );
    }

    #[test]
    fn test_builder_from_env() {
        unsafe {
            std::env::set_var("TIDEWAY_MAIL_DEFAULT", "audit");
            std::env::set_var("TIDEWAY_MAIL_FROM_ADDRESS", "env@example.com");
            std::env::set_var("TIDEWAY_MAIL_FROM_NAME", "Env Sender");
        }

        let config = MailConfigBuilder::new()
            .with_default("primary")
            .with_transport("primary", RawTransportConfig::new("memory"))
            .with_transport("audit", RawTransportConfig::new("log"))
            .from_env()
            .build();

        unsafe {
            std::env::remove_var("TIDEWAY_MAIL_DEFAULT");
            std::env::remove_var("TIDEWAY_MAIL_FROM_ADDRESS");
            std::env::remove_var("TIDEWAY_MAIL_FROM_NAME");
        }

        let config = config.unwrap();
        assert_eq!(config.default, "audit");
        assert_eq!(
            config.from,
            Some(Address::new("env@example.com").with_name("Env Sender"))
        );
    }
}
