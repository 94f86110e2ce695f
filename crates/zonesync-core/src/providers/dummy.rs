//! No-op provider
//!
//! Accepts every `upsert` and `delete` without talking to anything. Used
//! to exercise registry and engine wiring without a real backend.

use crate::config::{BackendConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::name::DomainName;
use crate::record::RecordSpec;
use crate::registry::FactoryRegistry;
use crate::traits::{DnsProvider, DnsProviderFactory};
use async_trait::async_trait;

/// Provider that logs and succeeds
#[derive(Debug, Clone)]
pub struct DummyProvider {
    zones: Vec<DomainName>,
}

impl DummyProvider {
    /// Create a dummy provider owning `zones`
    pub fn new(zones: Vec<DomainName>) -> Self {
        Self { zones }
    }
}

#[async_trait]
impl DnsProvider for DummyProvider {
    fn zones(&self) -> &[DomainName] {
        &self.zones
    }

    async fn upsert(&self, zone: &DomainName, record: &RecordSpec) -> Result<()> {
        tracing::info!("[dummy] Update successful: {} in zone {}", record.name, zone);
        Ok(())
    }

    async fn delete(&self, zone: &DomainName, record: &RecordSpec) -> Result<()> {
        tracing::info!("[dummy] Delete successful: {} in zone {}", record.name, zone);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "dummy"
    }
}

/// Factory for creating dummy providers
pub struct DummyFactory;

impl DnsProviderFactory for DummyFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config.backend {
            BackendConfig::Dummy => Ok(Box::new(DummyProvider::new(config.zones.clone()))),
            _ => Err(Error::config("Invalid config for dummy provider")),
        }
    }
}

/// Register the dummy provider with a factory registry
pub fn register(registry: &FactoryRegistry) {
    registry.register_provider("dummy", Box::new(DummyFactory));
}
