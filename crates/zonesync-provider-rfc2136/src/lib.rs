// # RFC2136 Dynamic Update Provider
//
// Writes records to any nameserver accepting RFC2136 updates (BIND,
// Knot, PowerDNS, ...), optionally authenticated with TSIG.
//
// ## Behaviour
//
// - `upsert` sends a single message that deletes the RRset for the
//   owner name and type, then adds every desired record. Repeating the
//   same upsert yields the same message and the same zone content.
// - `delete` sends only the RRset deletion.
// - The nameserver host is resolved on every send.
// - No retries: a failed send is returned to the caller as a transport
//   or protocol error.
//
// ## Security
//
// - The TSIG secret never appears in logs or Debug output
// - TSIG settings are all-or-nothing; a partial set fails construction

pub mod message;
pub mod nameserver;
pub mod transport;
pub mod tsig;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use zonesync_core::config::{BackendConfig, ProviderConfig, Rfc2136Config};
use zonesync_core::record::build_rrset;
use zonesync_core::traits::{DnsProvider, DnsProviderFactory};
use zonesync_core::{DomainName, Error, FactoryRegistry, RecordSpec, Result};

pub use nameserver::Nameserver;
pub use transport::{HickoryTransport, UpdateTransport};
pub use tsig::TsigKey;

/// RFC2136 DNS provider
pub struct Rfc2136Provider {
    zones: Vec<DomainName>,
    transport: Arc<dyn UpdateTransport>,
}

impl Rfc2136Provider {
    /// Build a provider talking to a real nameserver
    pub fn from_config(zones: Vec<DomainName>, config: &Rfc2136Config) -> Result<Self> {
        let tsig = TsigKey::from_parts(
            config.tsig_secret.as_deref(),
            config.tsig_key_name.as_deref(),
            config.tsig_algorithm.as_deref(),
        )?;
        let nameserver = Nameserver::parse(&config.nameserver)?;

        if config.timeout_secs == 0 {
            return Err(Error::config("RFC2136 timeout must be at least one second"));
        }

        tracing::debug!(
            "RFC2136 provider for {} (signed: {})",
            nameserver,
            tsig.is_some()
        );

        let transport = HickoryTransport::new(
            nameserver,
            config.protocol,
            Duration::from_secs(config.timeout_secs),
            tsig,
        );
        Ok(Self::with_transport(zones, Arc::new(transport)))
    }

    /// Build a provider over any transport
    pub fn with_transport(zones: Vec<DomainName>, transport: Arc<dyn UpdateTransport>) -> Self {
        Self { zones, transport }
    }
}

impl std::fmt::Debug for Rfc2136Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rfc2136Provider")
            .field("zones", &self.zones)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DnsProvider for Rfc2136Provider {
    fn zones(&self) -> &[DomainName] {
        &self.zones
    }

    async fn upsert(&self, zone: &DomainName, record: &RecordSpec) -> Result<()> {
        let record_type = record.validate()?;
        let rrset = build_rrset(record)?;
        let message = message::upsert_message(zone, &record.name, record_type, &rrset)?;

        tracing::info!(
            "Replacing {} {} in zone {} ({} record(s))",
            record.name,
            record_type,
            zone,
            rrset.len()
        );
        self.transport.send(message).await
    }

    async fn delete(&self, zone: &DomainName, record: &RecordSpec) -> Result<()> {
        let record_type = record.record_type()?;
        let message = message::delete_message(zone, &record.name, record_type)?;

        tracing::info!("Deleting {} {} from zone {}", record.name, record_type, zone);
        self.transport.send(message).await
    }

    fn provider_name(&self) -> &'static str {
        "rfc2136"
    }
}

/// Factory for creating RFC2136 providers
pub struct Rfc2136Factory;

impl DnsProviderFactory for Rfc2136Factory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match &config.backend {
            BackendConfig::Rfc2136(rfc) => Ok(Box::new(Rfc2136Provider::from_config(
                config.zones.clone(),
                rfc,
            )?)),
            _ => Err(Error::config("Invalid config for RFC2136 provider")),
        }
    }
}

/// Register the RFC2136 provider with a factory registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::FactoryRegistry;
///
/// let registry = FactoryRegistry::new();
/// zonesync_provider_rfc2136::register(&registry);
/// assert!(registry.has_provider("rfc2136"));
/// ```
pub fn register(registry: &FactoryRegistry) {
    registry.register_provider("rfc2136", Box::new(Rfc2136Factory));
}
