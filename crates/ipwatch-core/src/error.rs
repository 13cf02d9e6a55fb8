//! Error types for the ipwatch system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for ipwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ipwatch system
#[derive(Error, Debug)]
pub enum Error {
    /// The report stream carried no data
    #[error("No input: the health-check report stream is empty")]
    EmptyInput,

    /// Structurally malformed health-check report
    #[error("Report parse error: {0}")]
    Parse(String),

    /// Invalid domain specification
    #[error("Invalid domain spec: {0}")]
    Validation(String),

    /// Configured hosted zone does not exist in the provider
    #[error("Hosted zone not found: {zone}")]
    ZoneNotFound {
        /// Zone name that was looked up
        zone: String,
    },

    /// Reading the published record failed
    #[error("Record store read failed for {domain}: {message}")]
    StoreRead {
        /// Domain being reconciled
        domain: String,
        /// Underlying error message
        message: String,
    },

    /// Writing the record failed
    #[error("Record store write failed for {domain}: {message}")]
    StoreWrite {
        /// Domain being reconciled
        domain: String,
        /// Underlying error message
        message: String,
    },

    /// Notification delivery failed
    #[error("Notification failed for {domain}: {message}")]
    Notify {
        /// Domain whose change was being announced
        domain: String,
        /// Underlying error message
        message: String,
    },

    /// A domain's read-diff-write did not finish in time
    #[error("Reconciling {domain} timed out after {secs}s")]
    Timeout {
        /// Domain being reconciled
        domain: String,
        /// Configured limit in seconds
        secs: u64,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (reading the report stream)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Closed classification of [`Error`], used to pick process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmptyInput,
    Parse,
    Validation,
    ZoneNotFound,
    StoreRead,
    StoreWrite,
    Notify,
    Timeout,
    Config,
    Runtime,
}

impl Error {
    /// Create a report parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a domain validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(zone: impl Into<String>) -> Self {
        Self::ZoneNotFound { zone: zone.into() }
    }

    /// Create a record store read error
    pub fn store_read(domain: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreRead {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a record store write error
    pub fn store_write(domain: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreWrite {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a notification error
    pub fn notify(domain: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notify {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyInput => ErrorKind::EmptyInput,
            Error::Parse(_) | Error::Json(_) => ErrorKind::Parse,
            Error::Validation(_) => ErrorKind::Validation,
            Error::ZoneNotFound { .. } => ErrorKind::ZoneNotFound,
            Error::StoreRead { .. } => ErrorKind::StoreRead,
            Error::StoreWrite { .. } => ErrorKind::StoreWrite,
            Error::Notify { .. } => ErrorKind::Notify,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) | Error::Http(_) | Error::Provider { .. } | Error::Other(_) => {
                ErrorKind::Runtime
            }
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::EmptyInput.kind(), ErrorKind::EmptyInput);
        assert_eq!(Error::parse("bad").kind(), ErrorKind::Parse);
        assert_eq!(Error::zone_not_found("example.com").kind(), ErrorKind::ZoneNotFound);
        assert_eq!(
            Error::store_write("a.example.com", "boom").kind(),
            ErrorKind::StoreWrite
        );
        assert_eq!(Error::provider("cloudflare", "500").kind(), ErrorKind::Runtime);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(json_err).kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_messages_carry_context() {
        let err = Error::store_read("a.example.com", "connection reset");
        let msg = err.to_string();
        assert!(msg.contains("a.example.com"));
        assert!(msg.contains("connection reset"));
    }
}
