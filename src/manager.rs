//! Lazily built, cached mail transports with a switchable default
//!
//! The [`TransportManager`] is the single source of truth for which transport
//! is used to send mail. Transports are built on first use, one per
//! configured name, and kept for the lifetime of the manager.

use crate::config::MailConfig;
use crate::error::{MailError, Result};
use crate::registry::{Driver, TransportConfig, TransportRegistry};
use crate::traits::transport::{Email, Receipt, Transport};
use crate::transport::{TransportBuilder, builtin_builders};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to a built transport
///
/// Handles returned for the same name are the same allocation until the name
/// is invalidated, so `Arc::ptr_eq` identifies the cached instance.
pub type TransportHandle = Arc<ManagedTransport>;

/// A built transport together with the configuration it was built from
pub struct ManagedTransport {
    config: TransportConfig,
    transport: Box<dyn Transport>,
}

impl ManagedTransport {
    fn new(config: TransportConfig, transport: Box<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn name(&self) -> &str {
        self.config.name()
    }

    pub fn driver(&self) -> Driver {
        self.config.driver()
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Downcast to the concrete transport type
    pub fn downcast_ref<T: Transport + 'static>(&self) -> Option<&T> {
        self.transport.as_any().downcast_ref::<T>()
    }

    pub fn is_healthy(&self) -> bool {
        self.transport.is_healthy()
    }

    /// Send an email through this transport
    pub async fn send(&self, email: &Email) -> Result<Receipt> {
        match self.transport.send(email).await {
            Ok(receipt) => {
                tracing::debug!(
                    target: "tideway_mail::manager",
                    transport = self.name(),
                    driver = %self.driver(),
                    message_id = %receipt.message_id,
                    recipients = receipt.recipients,
                    "Email sent"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(
                    target: "tideway_mail::manager",
                    transport = self.name(),
                    driver = %self.driver(),
                    error = %e,
                    "Email send failed"
                );
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for ManagedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedTransport")
            .field("name", &self.name())
            .field("driver", &self.driver())
            .finish()
    }
}

/// Builds, caches and selects mail transports
///
/// # Concurrency
///
/// The cache is a `DashMap`. A miss holds the shard's write lock across the
/// check-build-store sequence, so concurrent `get` calls for the same name
/// build at most one transport; names that land in different shards build in
/// parallel. Builders must not call back into the manager.
///
/// The default name sits behind an `RwLock`, so `set_default` is atomic with
/// respect to readers.
///
/// # Example
///
/// ```rust,ignore
/// use tideway_mail::{RawTransportConfig, TransportManager, TransportRegistry};
///
/// let registry = TransportRegistry::load([
///     ("primary", RawTransportConfig::new("smtp").param("host", "smtp.example.com")),
///     ("audit", RawTransportConfig::new("log")),
/// ])?;
/// let manager = TransportManager::new(registry, "primary")?;
///
/// manager.get_default()?.send(&email).await?;
///
/// // Route everything through the log transport from now on
/// manager.set_default("audit")?;
/// ```
pub struct TransportManager {
    registry: Arc<TransportRegistry>,
    builders: HashMap<Driver, TransportBuilder>,
    cache: DashMap<String, TransportHandle>,
    default_name: RwLock<String>,
}

impl TransportManager {
    /// Create a manager over `registry` with `default_name` as the default
    ///
    /// Fails with a configuration error if `default_name` is not in the registry.
    pub fn new(
        registry: impl Into<Arc<TransportRegistry>>,
        default_name: impl Into<String>,
    ) -> Result<Self> {
        let registry = registry.into();
        let default_name = default_name.into();

        if !registry.contains(&default_name) {
            return Err(MailError::config(format!(
                "Default mail transport '{}' is not configured (available: {})",
                default_name,
                registry.names().join(", ")
            )));
        }

        Ok(Self {
            registry,
            builders: builtin_builders(),
            cache: DashMap::new(),
            default_name: RwLock::new(default_name),
        })
    }

    /// Create a manager from a mail configuration
    ///
    /// The configuration is validated first, so a malformed "from" or "to"
    /// address fails here rather than on the first send.
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.registry()?, config.default.clone())
    }

    /// Replace the builder used for `driver`
    ///
    /// Intended for startup, before the manager is shared. Transports already
    /// cached are not rebuilt.
    pub fn with_builder<F>(mut self, driver: Driver, builder: F) -> Self
    where
        F: Fn(&TransportConfig) -> Result<Box<dyn Transport>> + Send + Sync + 'static,
    {
        self.builders.insert(driver, Arc::new(builder));
        self
    }

    /// Get the transport configured under `name`, building it on first use
    ///
    /// Unknown names and construction failures are returned as
    /// [`MailError::Build`]; failures are not cached, so a later call
    /// retries construction.
    pub fn get(&self, name: &str) -> Result<TransportHandle> {
        if let Some(cached) = self.cache.get(name) {
            tracing::debug!(
                target: "tideway_mail::manager",
                transport = name,
                "Using cached mail transport"
            );
            return Ok(Arc::clone(cached.value()));
        }

        let handle = self
            .cache
            .entry(name.to_string())
            .or_try_insert_with(|| self.construct(name))?;

        Ok(Arc::clone(handle.value()))
    }

    /// Get the current default transport
    pub fn get_default(&self) -> Result<TransportHandle> {
        let name = self.default_name();
        self.get(&name)
    }

    /// Make `name` the default transport
    ///
    /// Fails with [`MailError::NotFound`] and leaves the default unchanged if
    /// `name` is not configured. Nothing is built or evicted.
    pub fn set_default(&self, name: &str) -> Result<()> {
        self.registry.resolve(name)?;

        let mut current = self
            .default_name
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if *current != name {
            tracing::info!(
                target: "tideway_mail::manager",
                from = %current.as_str(),
                to = name,
                "Switched default mail transport"
            );
            *current = name.to_string();
        }

        Ok(())
    }

    /// Name of the current default transport
    pub fn default_name(&self) -> String {
        self.default_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop the cached transport for `name` so the next `get` rebuilds it
    ///
    /// Handles already given out stay usable; the transport is released once
    /// the last one is dropped.
    pub fn invalidate(&self, name: &str) -> Option<TransportHandle> {
        let removed = self.cache.remove(name).map(|(_, handle)| handle);
        if removed.is_some() {
            tracing::info!(
                target: "tideway_mail::manager",
                transport = name,
                "Invalidated cached mail transport"
            );
        }
        removed
    }

    /// Drop every cached transport
    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Names with a built transport, sorted
    pub fn cached_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cache.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn registry(&self) -> &TransportRegistry {
        &self.registry
    }

    fn construct(&self, name: &str) -> Result<TransportHandle> {
        let config = self.registry.resolve(name).map_err(|e| {
            tracing::warn!(
                target: "tideway_mail::manager",
                transport = name,
                "Requested mail transport is not configured"
            );
            MailError::build(name, e)
        })?;

        let builder = self.builders.get(&config.driver()).ok_or_else(|| {
            MailError::build(
                name,
                MailError::internal(format!(
                    "No builder registered for the {} driver",
                    config.driver()
                )),
            )
        })?;

        match builder(config) {
            Ok(transport) => {
                tracing::info!(
                    target: "tideway_mail::manager",
                    transport = name,
                    driver = %config.driver(),
                    "Built mail transport"
                );
                Ok(Arc::new(ManagedTransport::new(config.clone(), transport)))
            }
            Err(e) => {
                tracing::warn!(
                    target: "tideway_mail::manager",
                    transport = name,
                    driver = %config.driver(),
                    error = %e,
                    "Failed to build mail transport"
                );
                Err(MailError::build(name, e))
            }
        }
    }
}

impl std::fmt::Debug for TransportManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportManager")
            .field("transports", &self.registry.names())
            .field("default", &self.default_name())
            .field("cached", &self.cached_names())
            .finish()
    }
}
