//! Configuration types for zonesync
//!
//! This module defines the provider configuration handed to factories and
//! the desired-state document consumed by the daemon. Structural checks
//! live here; credential checks belong to each backend's factory so that
//! their error kinds surface at provider construction.

use crate::error::{Error, Result};
use crate::name::DomainName;
use crate::record::{DeletionPolicy, RecordSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default Cloudflare API base URL
pub const DEFAULT_CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default RFC2136 request timeout
pub const DEFAULT_RFC2136_TIMEOUT_SECS: u64 = 5;

/// Configuration of one provider instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Zones the provider is authoritative for (at least one)
    pub zones: Vec<DomainName>,

    /// Backend-specific settings
    #[serde(flatten)]
    pub backend: BackendConfig,
}

impl ProviderConfig {
    /// Create a provider configuration
    pub fn new(zones: Vec<DomainName>, backend: BackendConfig) -> Self {
        Self { zones, backend }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<()> {
        if self.zones.is_empty() {
            return Err(Error::config("Provider must own at least one zone"));
        }

        if let BackendConfig::Custom { factory, config } = &self.backend {
            if factory.is_empty() {
                return Err(Error::config("Custom provider factory cannot be empty"));
            }
            if config.is_null() {
                return Err(Error::config("Custom provider config cannot be null"));
            }
        }

        Ok(())
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match &self.backend {
            BackendConfig::Dummy => "dummy",
            BackendConfig::Rfc2136(_) => "rfc2136",
            BackendConfig::Cloudflare(_) => "cloudflare",
            BackendConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// No-op backend
    Dummy,

    /// RFC2136 Dynamic Update
    Rfc2136(Rfc2136Config),

    /// Cloudflare v4 API
    Cloudflare(CloudflareConfig),

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

/// Transport used for Dynamic Update messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsTransport {
    #[default]
    Udp,
    Tcp,
}

/// RFC2136 backend settings
///
/// TSIG is optional, but `tsig_secret`, `tsig_key_name` and
/// `tsig_algorithm` must then all be present.
#[derive(Clone, Serialize, Deserialize)]
pub struct Rfc2136Config {
    /// `host[:port]`, IPv6 hosts in brackets; port defaults to 53
    pub nameserver: String,

    /// Base64 encoded shared secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsig_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsig_key_name: Option<String>,

    /// One of MD5, SHA1, SHA256, SHA512, optionally prefixed with HMAC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsig_algorithm: Option<String>,

    #[serde(default)]
    pub protocol: DnsTransport,

    /// Per-request timeout enforced by the transport
    #[serde(default = "default_rfc2136_timeout_secs")]
    pub timeout_secs: u64,
}

impl Rfc2136Config {
    /// Settings for an unsigned UDP nameserver
    pub fn new(nameserver: impl Into<String>) -> Self {
        Self {
            nameserver: nameserver.into(),
            tsig_secret: None,
            tsig_key_name: None,
            tsig_algorithm: None,
            protocol: DnsTransport::default(),
            timeout_secs: DEFAULT_RFC2136_TIMEOUT_SECS,
        }
    }

    /// Add TSIG settings
    pub fn with_tsig(
        mut self,
        secret: impl Into<String>,
        key_name: impl Into<String>,
        algorithm: impl Into<String>,
    ) -> Self {
        self.tsig_secret = Some(secret.into());
        self.tsig_key_name = Some(key_name.into());
        self.tsig_algorithm = Some(algorithm.into());
        self
    }
}

// Custom Debug implementation that hides the TSIG secret
impl fmt::Debug for Rfc2136Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rfc2136Config")
            .field("nameserver", &self.nameserver)
            .field("tsig_secret", &self.tsig_secret.as_ref().map(|_| "<REDACTED>"))
            .field("tsig_key_name", &self.tsig_key_name)
            .field("tsig_algorithm", &self.tsig_algorithm)
            .field("protocol", &self.protocol)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Cloudflare backend settings
///
/// Authenticate with either `api_token`, or `api_key` together with `email`.
#[derive(Clone, Serialize, Deserialize)]
pub struct CloudflareConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Account email, required with `api_key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Proxied flag for records without an explicit override
    #[serde(default = "default_proxied")]
    pub proxied_by_default: bool,

    /// API endpoint, defaults to [`DEFAULT_CLOUDFLARE_API_BASE`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl CloudflareConfig {
    /// Settings authenticating with an API token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            api_token: Some(token.into()),
            api_key: None,
            email: None,
            proxied_by_default: default_proxied(),
            base_url: None,
        }
    }

    /// Settings authenticating with a global API key
    pub fn with_key(key: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            api_token: None,
            api_key: Some(key.into()),
            email: Some(email.into()),
            proxied_by_default: default_proxied(),
            base_url: None,
        }
    }
}

// Custom Debug implementation that hides the credentials
impl fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<REDACTED>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<REDACTED>"))
            .field("email", &self.email)
            .field("proxied_by_default", &self.proxied_by_default)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_rfc2136_timeout_secs() -> u64 {
    DEFAULT_RFC2136_TIMEOUT_SECS
}

fn default_proxied() -> bool {
    true
}

/// Whether a managed record should exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

/// A record in the desired-state document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedRecord {
    /// Id of the provider managing the record
    pub provider: String,

    #[serde(default)]
    pub ensure: Ensure,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,

    #[serde(flatten)]
    pub spec: RecordSpec,
}

/// Desired-state document: providers by id, and the records they manage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,

    #[serde(default)]
    pub records: Vec<ManagedRecord>,
}

impl SyncConfig {
    /// Parse a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (id, provider) in &self.providers {
            provider
                .validate()
                .map_err(|e| Error::config(format!("provider {id}: {e}")))?;
        }

        for record in &self.records {
            if !self.providers.contains_key(&record.provider) {
                return Err(Error::config(format!(
                    "record {} references unknown provider {}",
                    record.spec.name, record.provider
                )));
            }
            record.spec.validate()?;
        }

        Ok(())
    }
}
