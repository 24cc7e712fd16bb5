use crate::error::{MailError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::params::ParamValue;

/// Transport driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// SMTP relay via lettre
    Smtp,
    /// Local sendmail-compatible command
    Sendmail,
    /// Writes messages to the tracing log
    Log,
    /// HTTP API provider (JSON POST)
    Api,
    /// Keeps messages in memory (for testing)
    Memory,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const SMTP_ENCRYPTIONS: [&str; 3] = ["starttls", "tls", "none"];

impl Driver {
    pub const ALL: [Driver; 5] = [
        Driver::Smtp,
        Driver::Sendmail,
        Driver::Log,
        Driver::Api,
        Driver::Memory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Smtp => "smtp",
            Driver::Sendmail => "sendmail",
            Driver::Log => "log",
            Driver::Api => "api",
            Driver::Memory => "memory",
        }
    }

    /// Fields that must be present for this driver
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            Driver::Smtp => &["host"],
            Driver::Sendmail => &["command"],
            Driver::Api => &["endpoint", "api_key"],
            Driver::Log | Driver::Memory => &[],
        }
    }

    /// Every field this driver understands
    pub fn known_params(&self) -> &'static [&'static str] {
        match self {
            Driver::Smtp => &["host", "port", "username", "password", "encryption", "timeout_secs"],
            Driver::Sendmail => &["command"],
            Driver::Log => &["level", "full_output"],
            Driver::Api => &["endpoint", "api_key", "timeout_secs"],
            Driver::Memory => &[],
        }
    }

    /// Check `params` against this driver's schema
    ///
    /// Unknown fields are tolerated and reported at `warn`.
    pub fn validate(&self, name: &str, params: &BTreeMap<String, ParamValue>) -> Result<()> {
        for required in self.required_params() {
            if !params.contains_key(*required) {
                return Err(MailError::config(format!(
                    "Transport '{}' ({} driver) is missing required field '{}'",
                    name, self, required
                )));
            }
        }

        for key in params.keys() {
            if !self.known_params().contains(&key.as_str()) {
                tracing::warn!(
                    target: "tideway_mail::registry",
                    transport = name,
                    driver = %self,
                    field = %key,
                    "Ignoring unknown transport field"
                );
            }
        }

        let field = Field { transport: name, params };

        match self {
            Driver::Smtp => {
                field.non_empty_str("host")?;
                if let Some(port) = field.opt_int("port")? {
                    if !(1..=i64::from(u16::MAX)).contains(&port) {
                        return Err(field.invalid("port", "must be between 1 and 65535"));
                    }
                }
                let username = field.opt_str("username")?;
                let password = field.opt_str("password")?;
                if username.is_some() != password.is_some() {
                    return Err(MailError::config(format!(
                        "Transport '{}' must set both 'username' and 'password' or neither",
                        name
                    )));
                }
                if let Some(encryption) = field.opt_str("encryption")? {
                    if !SMTP_ENCRYPTIONS.contains(&encryption.to_lowercase().as_str()) {
                        return Err(field.invalid(
                            "encryption",
                            &format!("must be one of: {}", SMTP_ENCRYPTIONS.join(", ")),
                        ));
                    }
                }
                field.opt_positive_int("timeout_secs")?;
            }
            Driver::Sendmail => {
                field.non_empty_str("command")?;
            }
            Driver::Log => {
                if let Some(level) = field.opt_str("level")? {
                    if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                        return Err(field.invalid(
                            "level",
                            &format!("must be one of: {}", LOG_LEVELS.join(", ")),
                        ));
                    }
                }
                field.opt_bool("full_output")?;
            }
            Driver::Api => {
                let endpoint = field.non_empty_str("endpoint")?;
                let url = url::Url::parse(endpoint)
                    .map_err(|e| field.invalid("endpoint", &format!("is not a valid URL ({})", e)))?;
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(field.invalid("endpoint", "must use http or https"));
                }
                field.non_empty_str("api_key")?;
                field.opt_positive_int("timeout_secs")?;
            }
            Driver::Memory => {}
        }

        Ok(())
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Driver {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Driver::ALL
            .into_iter()
            .find(|driver| driver.as_str() == wanted)
            .ok_or_else(|| {
                MailError::config(format!(
                    "Unknown mail driver '{}'. Must be one of: {}",
                    s,
                    Driver::ALL.map(|d| d.as_str()).join(", ")
                ))
            })
    }
}

/// Typed field checks for one transport's parameters
struct Field<'a> {
    transport: &'a str,
    params: &'a BTreeMap<String, ParamValue>,
}

impl<'a> Field<'a> {
    fn invalid(&self, key: &str, reason: &str) -> MailError {
        MailError::config(format!(
            "Transport '{}' field '{}' {}",
            self.transport, key, reason
        ))
    }

    fn opt_str(&self, key: &str) -> Result<Option<&'a str>> {
        match self.params.get(key) {
            None => Ok(None),
            Some(ParamValue::String(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(self.invalid(key, &format!("must be a string, got {}", other.kind()))),
        }
    }

    fn non_empty_str(&self, key: &str) -> Result<&'a str> {
        match self.opt_str(key)? {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(self.invalid(key, "must be a non-empty string")),
        }
    }

    fn opt_int(&self, key: &str) -> Result<Option<i64>> {
        match self.params.get(key) {
            None => Ok(None),
            Some(ParamValue::Integer(value)) => Ok(Some(*value)),
            Some(other) => Err(self.invalid(key, &format!("must be an integer, got {}", other.kind()))),
        }
    }

    fn opt_positive_int(&self, key: &str) -> Result<Option<i64>> {
        match self.opt_int(key)? {
            Some(value) if value <= 0 => Err(self.invalid(key, "must be greater than 0")),
            other => Ok(other),
        }
    }

    fn opt_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.params.get(key) {
            None => Ok(None),
            Some(ParamValue::Bool(value)) => Ok(Some(*value)),
            Some(other) => Err(self.invalid(key, &format!("must be a boolean, got {}", other.kind()))),
        }
    }
}
