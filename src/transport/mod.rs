//! Built-in mail transports
//!
//! Each driver has a transport type and a builder that constructs it from a
//! validated [`TransportConfig`]:
//! - `smtp` → [`SmtpTransport`] (lettre SMTP relay)
//! - `sendmail` → [`SendmailTransport`] (local sendmail binary)
//! - `log` → [`LogTransport`] (tracing output, for development)
//! - `api` → [`ApiTransport`] (JSON over HTTP)
//! - `memory` → [`MemoryTransport`] (stores messages, for tests)

mod api;
mod log;
mod memory;
mod message;
mod sendmail;
mod smtp;

pub use api::ApiTransport;
pub use log::LogTransport;
pub use memory::MemoryTransport;
pub use sendmail::SendmailTransport;
pub use smtp::{SmtpEncryption, SmtpSettings, SmtpTransport};

use crate::error::Result;
use crate::registry::{Driver, TransportConfig};
use crate::traits::transport::Transport;
use std::collections::HashMap;
use std::sync::Arc;

/// Function that constructs a transport from its configuration
///
/// Builders run synchronously and may block (e.g., to prepare a connection
/// pool). A returned error is reported to the caller and nothing is cached.
pub type TransportBuilder =
    Arc<dyn Fn(&TransportConfig) -> Result<Box<dyn Transport>> + Send + Sync>;

fn build_smtp(config: &TransportConfig) -> Result<Box<dyn Transport>> {
    Ok(Box::new(SmtpTransport::from_config(config)?))
}

fn build_sendmail(config: &TransportConfig) -> Result<Box<dyn Transport>> {
    Ok(Box::new(SendmailTransport::from_config(config)?))
}

fn build_log(config: &TransportConfig) -> Result<Box<dyn Transport>> {
    Ok(Box::new(LogTransport::from_config(config)?))
}

fn build_api(config: &TransportConfig) -> Result<Box<dyn Transport>> {
    Ok(Box::new(ApiTransport::from_config(config)?))
}

fn build_memory(_config: &TransportConfig) -> Result<Box<dyn Transport>> {
    Ok(Box::new(MemoryTransport::new()))
}

/// Builder for a single built-in driver
pub fn builtin_builder(driver: Driver) -> TransportBuilder {
    let build: fn(&TransportConfig) -> Result<Box<dyn Transport>> = match driver {
        Driver::Smtp => build_smtp,
        Driver::Sendmail => build_sendmail,
        Driver::Log => build_log,
        Driver::Api => build_api,
        Driver::Memory => build_memory,
    };
    Arc::new(build)
}

/// Builder table covering every built-in driver
pub fn builtin_builders() -> HashMap<Driver, TransportBuilder> {
    Driver::ALL
        .into_iter()
        .map(|driver| (driver, builtin_builder(driver)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RawTransportConfig, TransportRegistry};

    #[test]
    fn test_builtin_table_covers_every_driver() {
        let builders = builtin_builders();
        for driver in Driver::ALL {
            assert!(builders.contains_key(&driver), "missing builder for {}", driver);
        }
    }

    #[test]
    fn test_builtin_builder_produces_matching_type() {
        let registry = TransportRegistry::load([
            ("audit", RawTransportConfig::new("log")),
            ("mem", RawTransportConfig::new("memory")),
        ])
        .unwrap();

        let log = builtin_builder(Driver::Log)(registry.resolve("audit").unwrap()).unwrap();
        assert!(log.as_any().downcast_ref::<LogTransport>().is_some());

        let mem = builtin_builder(Driver::Memory)(registry.resolve("mem").unwrap()).unwrap();
        assert!(mem.as_any().downcast_ref::<MemoryTransport>().is_some());
    }
}
