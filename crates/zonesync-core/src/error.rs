//! Error types for zonesync
//!
//! This module defines all error types used throughout the workspace.
//! Backends map their library errors onto these variants so callers can
//! decide on retries without knowing which backend produced the failure.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// Domain name grammar violation
    #[error("Invalid domain name: {0}")]
    InvalidName(String),

    /// No recognized payload, or a record type the backend does not implement
    #[error("Unsupported record: {0}")]
    UnsupportedRecordType(String),

    /// IP literal that does not parse, or parses as the wrong address family
    #[error("Invalid {expected} address: {literal}")]
    InvalidAddressLiteral {
        /// The offending literal
        literal: String,
        /// Address family the payload required ("IPv4" or "IPv6")
        expected: &'static str,
    },

    /// TTL outside of the accepted range
    #[error("Invalid TTL {0}: must be between 1 and 604800 seconds")]
    InvalidTtl(u32),

    /// None of the provider's zones contains the record name
    #[error("No zone owned by the provider matches {name}")]
    NoOwningZone {
        /// The record owner name
        name: String,
    },

    /// Required credential absent from the provider configuration
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Only part of the TSIG configuration was supplied
    #[error("Incomplete TSIG configuration: {0}")]
    IncompleteTsigConfig(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No factory registered for the requested provider type
    #[error("Unknown provider type: {0}")]
    UnknownProviderType(String),

    /// No live provider registered under the given id
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Network or connection failure talking to the backend
    #[error("Transport failure ({provider}): {message}")]
    Transport {
        /// Provider name
        provider: &'static str,
        /// Error message
        message: String,
    },

    /// The backend answered with a non-success code
    #[error("Protocol failure ({provider}): {code}: {message}")]
    Protocol {
        /// Provider name
        provider: &'static str,
        /// DNS response code or HTTP status
        code: String,
        /// Error message
        message: String,
    },

    /// The backend has no zone with the requested name
    #[error("Backend lookup failure ({provider}): zone {zone} not found")]
    BackendLookup {
        /// Provider name
        provider: &'static str,
        /// Zone name that could not be resolved
        zone: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid name error
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName(name.into())
    }

    /// Create an unsupported record error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedRecordType(msg.into())
    }

    /// Create a "no owning zone" error
    pub fn no_owning_zone(name: impl Into<String>) -> Self {
        Self::NoOwningZone { name: name.into() }
    }

    /// Create a missing credential error
    pub fn missing_credential(msg: impl Into<String>) -> Self {
        Self::MissingCredential(msg.into())
    }

    /// Create an incomplete TSIG configuration error
    pub fn incomplete_tsig(msg: impl Into<String>) -> Self {
        Self::IncompleteTsigConfig(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            provider,
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(
        provider: &'static str,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Protocol {
            provider,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a backend lookup error
    pub fn backend_lookup(provider: &'static str, zone: impl Into<String>) -> Self {
        Self::BackendLookup {
            provider,
            zone: zone.into(),
        }
    }

    /// Whether retrying the same call later may succeed
    ///
    /// Transport and protocol failures are potentially transient. Every
    /// other kind stems from the input or the configuration and will fail
    /// again until that changes.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Protocol { .. })
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
    fn test_retriable_kinds() {
        assert!(Error::transport("rfc2136", "connection refused").is_retriable());
        assert!(Error::protocol("cloudflare", "503", "unavailable").is_retriable());

        assert!(!Error::no_owning_zone("www.example.org").is_retriable());
        assert!(!Error::unsupported("no payload").is_retriable());
        assert!(!Error::invalid_name("-bad").is_retriable());
        assert!(!Error::backend_lookup("cloudflare", "example.com.").is_retriable());
    }

    #[test]
    fn test_display_carries_context() {
        let err = Error::protocol("rfc2136", "REFUSED", "server rejected update");
        assert_eq!(
            err.to_string(),
            "Protocol failure (rfc2136): REFUSED: server rejected update"
        );

        let err = Error::InvalidAddressLiteral {
            literal: "999.1.1.1".to_string(),
            expected: "IPv4",
        };
        assert_eq!(err.to_string(), "Invalid IPv4 address: 999.1.1.1");
    }
}
