//! Tideway Mail - named mail transports with a switchable default
//!
//! Applications configure any number of named transports (an SMTP relay, a
//! local sendmail binary, an HTTP mail API, a log sink) and pick one as the
//! default. Transports are built lazily on first use and cached for the life
//! of the [`TransportManager`].
//!
//! # Features
//!
//! - **Registry**: validated, read-only transport configurations by name
//! - **Manager**: lazy construction, one instance per name, runtime default switching
//! - **Drivers**: `smtp`, `sendmail`, `log`, `api` and an in-memory driver for tests
//! - **Mailer**: global "from" and catch-all "to" addresses applied on send
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tideway_mail::{Email, MailConfig, Mailer};
//!
//! #[tokio::main]
//! async fn main() -> tideway_mail::Result<()> {
//!     tideway_mail::init_tracing();
//!
//!     let config = MailConfig::from_toml_str(r#"
//!         default = "primary"
//!
//!         [from]
//!         address = "noreply@example.com"
//!
//!         [transports.primary]
//!         driver = "smtp"
//!         host = "smtp.example.com"
//!
//!         [transports.audit]
//!         driver = "log"
//!     "#)?;
//!
//!     let mailer = Mailer::from_config(&config)?;
//!     mailer.transports().set_default("audit")?;
//!
//!     mailer
//!         .send(Email::without_sender("user@example.com", "Welcome").text("Hello!"))
//!         .await?;
//!     Ok(())
//! }
//! ```

mod app;
mod config;
mod error;
mod mailer;
mod manager;
pub mod registry;
pub mod traits;
pub mod transport;
pub mod utils;

// Re-exports for public API
pub use app::{AppContext, AppContextBuilder};
pub use config::{Address, MailConfig, MailConfigBuilder};
pub use error::{MailError, Result};
pub use mailer::Mailer;
pub use manager::{ManagedTransport, TransportHandle, TransportManager};
pub use registry::{Driver, ParamValue, RawTransportConfig, TransportConfig, TransportRegistry};
pub use traits::transport::{Email, Receipt, Transport};
pub use transport::TransportBuilder;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "tideway_mail=debug")
/// - `TIDEWAY_MAIL_LOG_JSON`: Set to "true" for JSON formatted logs
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::get_env_flag("MAIL_LOG_JSON").unwrap_or(false);

    let result = if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    if result.is_err() {
        tracing::debug!(
            target: "tideway_mail",
            "Tracing subscriber already installed"
        );
    }
}
