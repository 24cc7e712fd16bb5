//! Named transport configurations
//!
//! The registry is built once from static configuration and is read-only
//! afterwards. It only answers "which configurations exist"; building and
//! selecting transports is the job of [`TransportManager`](crate::TransportManager).

mod driver;
mod params;

pub use driver::Driver;
pub use params::{ParamValue, TransportConfig};

use crate::error::{MailError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Unvalidated transport settings as they appear in configuration
///
/// `driver` selects the implementation; every other field is driver-specific.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawTransportConfig {
    pub driver: String,
    #[serde(flatten)]
    pub params: BTreeMap<String, ParamValue>,
}

impl RawTransportConfig {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            params: BTreeMap::new(),
        }
    }

    /// Set a driver-specific field
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Read-only collection of named transport configurations
#[derive(Debug, Clone, Default)]
pub struct TransportRegistry {
    transports: BTreeMap<String, TransportConfig>,
}

impl TransportRegistry {
    /// Parse and validate named transport settings
    ///
    /// Fails with a configuration error when a name is empty or duplicated,
    /// a driver is unknown, or a driver's required fields are missing or
    /// malformed.
    pub fn load<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, RawTransportConfig)>,
        S: Into<String>,
    {
        let mut transports = BTreeMap::new();

        for (name, raw) in raw {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(MailError::config("Transport names must not be empty"));
            }

            let driver: Driver = raw.driver.parse().map_err(|e| match e {
                MailError::Config(msg) => MailError::config(format!("Transport '{}': {}", name, msg)),
                other => other,
            })?;
            driver.validate(&name, &raw.params)?;

            match transports.entry(name) {
                Entry::Occupied(entry) => {
                    return Err(MailError::config(format!(
                        "Transport '{}' is defined more than once",
                        entry.key()
                    )));
                }
                Entry::Vacant(entry) => {
                    let config = TransportConfig::new(entry.key().clone(), driver, raw.params);
                    entry.insert(config);
                }
            }
        }

        tracing::debug!(
            target: "tideway_mail::registry",
            count = transports.len(),
            "Loaded mail transport registry"
        );

        Ok(Self { transports })
    }

    /// Look up a transport configuration by name
    pub fn resolve(&self, name: &str) -> Result<&TransportConfig> {
        self.transports
            .get(name)
            .ok_or_else(|| MailError::not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transports.contains_key(name)
    }

    /// All transport names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.transports.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.transports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransportConfig> {
        self.transports.values()
    }
}
