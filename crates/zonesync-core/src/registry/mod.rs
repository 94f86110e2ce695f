//! Provider registries
//!
//! Two tables live here:
//!
//! - [`FactoryRegistry`] maps a provider type tag ("rfc2136", "cloudflare",
//!   ...) to the factory that builds it. It is filled once at startup.
//! - [`ProviderRegistry`] maps an external provider id (for instance a
//!   namespaced name) to the live provider built from that id's
//!   configuration. It changes whenever a configuration changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonesync_core::{FactoryRegistry, ProviderRegistry};
//!
//! let factories = FactoryRegistry::new();
//! zonesync_core::providers::dummy::register(&factories);
//! zonesync_provider_cloudflare::register(&factories);
//!
//! let providers = ProviderRegistry::new();
//! providers.configure("default/cloudflare", &config, &factories)?;
//!
//! let provider = providers.get("default/cloudflare");
//! ```
//!
//! ## Lock discipline
//!
//! Both tables use a `std::sync::RwLock`: lookups take the shared lock,
//! registration and removal take the exclusive lock. No lock is held
//! while a provider is constructed or while a provider call runs, so a
//! slow backend never blocks lookups.

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry of provider factories, keyed by provider type
#[derive(Default)]
pub struct FactoryRegistry {
    factories: RwLock<HashMap<String, Arc<dyn DnsProviderFactory>>>,
}

impl FactoryRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "cloudflare", "rfc2136")
    /// - `factory`: Factory object for creating provider instances
    ///
    /// Registering the same name twice replaces the earlier factory.
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        let name = name.into();
        tracing::debug!("Registering provider factory: {}", name);
        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        factories.insert(name, Arc::from(factory));
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If the configuration is invalid, the provider type
    ///   is not registered, or creation fails
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        config.validate()?;

        let provider_type = config.type_name();
        let factory = {
            let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
            factories
                .get(provider_type)
                .cloned()
                .ok_or_else(|| Error::UnknownProviderType(provider_type.to_string()))?
        };

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        factories.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        factories.contains_key(name)
    }
}

/// Live providers keyed by external id
///
/// Constructed once at process start and shared (behind an `Arc`) with
/// every reconciliation call site. Readers receive an `Arc` to the
/// provider, so a provider replaced or removed while a call is in flight
/// stays alive until that call completes.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn DnsProvider>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a fully constructed provider under `id`, replacing any previous one
    pub fn set(&self, id: impl Into<String>, provider: Arc<dyn DnsProvider>) {
        let id = id.into();
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        if providers.insert(id.clone(), provider).is_some() {
            tracing::debug!("Replaced provider {}", id);
        } else {
            tracing::debug!("Registered provider {}", id);
        }
    }

    /// Look up the provider registered under `id`
    pub fn get(&self, id: &str) -> Option<Arc<dyn DnsProvider>> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.get(id).cloned()
    }

    /// Remove the provider registered under `id`; unknown ids are ignored
    pub fn remove(&self, id: &str) -> Option<Arc<dyn DnsProvider>> {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        let removed = providers.remove(id);
        if removed.is_some() {
            tracing::debug!("Removed provider {}", id);
        }
        removed
    }

    /// Build a provider from `config` and publish it under `id`
    ///
    /// Construction happens before any lock is taken. On error nothing is
    /// published and a provider previously registered under `id` stays
    /// in place.
    pub fn configure(
        &self,
        id: impl Into<String>,
        config: &ProviderConfig,
        factories: &FactoryRegistry,
    ) -> Result<()> {
        let id = id.into();
        let provider = factories.create_provider(config).inspect_err(|e| {
            tracing::warn!("Cannot build provider {}: {}", id, e);
        })?;

        tracing::info!(
            "Provider {} ready ({}, {} zone(s))",
            id,
            provider.provider_name(),
            provider.zones().len()
        );
        self.set(id, Arc::from(provider));
        Ok(())
    }

    /// Ids of all registered providers
    pub fn ids(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.keys().cloned().collect()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no provider is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use crate::name::DomainName;

    struct FailingFactory;

    impl DnsProviderFactory for FailingFactory {
        fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
            Err(Error::missing_credential("no credential configured"))
        }
    }

    fn custom_config(factory: &str) -> ProviderConfig {
        ProviderConfig::new(
            vec![DomainName::parse("example.com.").unwrap()],
            BackendConfig::Custom {
                factory: factory.to_string(),
                config: serde_json::json!({}),
            },
        )
    }

    #[test]
    fn test_factory_registration() {
        let factories = FactoryRegistry::new();

        // Initially empty
        assert!(!factories.has_provider("failing"));

        // Register
        factories.register_provider("failing", Box::new(FailingFactory));

        // Now present
        assert!(factories.has_provider("failing"));
        assert!(factories.list_providers().contains(&"failing".to_string()));
    }

    #[test]
    fn test_unknown_provider_type() {
        let factories = FactoryRegistry::new();
        let result = factories.create_provider(&custom_config("nope"));
        assert!(matches!(result, Err(Error::UnknownProviderType(t)) if t == "nope"));
    }

    #[test]
    fn test_failed_construction_is_not_published() {
        let factories = FactoryRegistry::new();
        factories.register_provider("failing", Box::new(FailingFactory));

        let providers = ProviderRegistry::new();
        let result = providers.configure("default/p", &custom_config("failing"), &factories);

        assert!(matches!(result, Err(Error::MissingCredential(_))));
        assert!(providers.get("default/p").is_none());
        assert!(providers.is_empty());
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let providers = ProviderRegistry::new();
        assert!(providers.remove("missing").is_none());
        assert_eq!(providers.len(), 0);
    }
}
