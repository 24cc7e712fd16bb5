/// The main error type for tideway-mail
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Mail transport not found: {0}")]
    NotFound(String),

    #[error("Failed to build mail transport '{name}': {source}")]
    Build {
        name: String,
        #[source]
        source: Box<MailError>,
    },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Failed to send email: {0}")]
    Send(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl MailError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Wrap a construction failure for the transport `name`
    pub fn build(name: impl Into<String>, source: MailError) -> Self {
        Self::Build {
            name: name.into(),
            source: Box::new(source),
        }
    }

    pub fn invalid_message(msg: impl Into<String>) -> Self {
        Self::InvalidMessage(msg.into())
    }

    pub fn send(msg: impl Into<String>) -> Self {
        Self::Send(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_build(&self) -> bool {
        matches!(self, Self::Build { .. })
    }

    /// The error a `Build` failure wraps, if this is one
    pub fn build_cause(&self) -> Option<&MailError> {
        match self {
            Self::Build { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for tideway-mail operations
pub type Result<T> = std::result::Result<T, MailError>;

impl From<toml::de::Error> for MailError {
    fn from(err: toml::de::Error) -> Self {
        MailError::Config(format!("Invalid mail configuration: {}", err))
    }
}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MailError::Send("Mail API request timed out".to_string())
        } else if err.is_connect() {
            MailError::Send(format!("Mail API connection error: {}", err))
        } else if let Some(status) = err.status() {
            MailError::Send(format!("Mail API returned {}: {}", status, err))
        } else {
            MailError::Send(format!("Mail API request error: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_keeps_cause() {
        let err = MailError::build("primary", MailError::not_found("primary"));
        assert!(err.is_build());
        assert!(err.build_cause().is_some_and(MailError::is_not_found));
        assert_eq!(
            err.to_string(),
            "Failed to build mail transport 'primary': Mail transport not found: primary"
        );
    }

    #[test]
    fn test_build_cause_is_none_for_other_kinds() {
        assert!(MailError::config("bad").build_cause().is_none());
        assert!(!MailError::send("boom").is_build());
    }

    #[test]
    fn test_toml_error_becomes_config_error() {
        let err: MailError = toml::from_str::<toml::Table>("default = ").unwrap_err().into();
        assert!(err.is_config());
    }
}
