// # DNS Provider Trait
//
// Defines the interface every DNS backend implements.
//
// ## Implementations
//
// - Dummy: `zonesync_core::providers::dummy`
// - RFC2136 Dynamic Update: `zonesync-provider-rfc2136` crate
// - Cloudflare: `zonesync-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::{DnsProvider, find_owning_zone};
//
// let zone = find_owning_zone(provider.zones(), &spec.name)?;
// provider.upsert(zone, &spec).await?;
// ```

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::name::DomainName;
use crate::record::RecordSpec;
use async_trait::async_trait;

/// Trait for DNS provider implementations
///
/// A provider is built once per provider configuration and kept until that
/// configuration changes or disappears. Its zone set is fixed for its
/// whole lifetime.
///
/// # Thread Safety
///
/// Implementations must be thread-safe: the registry hands the same
/// instance to any number of concurrent callers.
///
/// # Single Attempt
///
/// `upsert` and `delete` perform one attempt and report the outcome.
/// They never retry, sleep or spawn work that outlives the call. Both are
/// safe to repeat, so callers may wrap them in their own retry policy.
///
/// # Consistency
///
/// Providers do not serialize calls. Callers that need a consistent view
/// of a backend must not run two operations on the same
/// (zone, owner, type) concurrently.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Zones this provider is authoritative for
    fn zones(&self) -> &[DomainName];

    /// Make the backend RRset for (owner, type) match `record` exactly
    ///
    /// Records of the set that are not in `record` are removed; the
    /// operation replaces, it never merges.
    ///
    /// # Parameters
    ///
    /// - `zone`: the owning zone, as selected by [`crate::find_owning_zone`]
    /// - `record`: the desired RRset
    async fn upsert(&self, zone: &DomainName, record: &RecordSpec) -> Result<()>;

    /// Remove the RRset for (owner, type), whatever it currently holds
    ///
    /// Removing a set that does not exist succeeds.
    async fn delete(&self, zone: &DomainName, record: &RecordSpec) -> Result<()>;

    /// Get the provider name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the provider (e.g., "cloudflare", "rfc2136")
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// Configuration errors (missing credentials, partial TSIG settings,
    /// malformed addresses) abort construction; no partially configured
    /// provider is ever returned.
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>>;
}
