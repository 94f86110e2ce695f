// # Cloudflare DNS Provider
//
// Keeps an RRset on Cloudflare equal to a desired record set by diffing
// against what the API reports.
//
// ## Behaviour
//
// - `upsert`: list the records of (name, type), keep exact matches,
//   delete the rest, then create what is missing. Deletes go first so a
//   CNAME never collides with a record it replaces.
// - `delete`: list the records of (name, type) and delete each of them.
//   Nothing present is not an error.
// - Zone ids are resolved once per zone and cached for the provider's
//   lifetime (see `ZoneIdCache`).
// - The diff is not atomic: an observer may see a partially applied set.
//   Callers serialize calls per (zone, name, type).
// - No retries; failures are returned as transport or protocol errors.
//
// ## Security
//
// - API token and key never appear in logs or Debug output
// - The factory fails fast when no usable credential is configured
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/

pub mod api;
pub mod cache;
pub mod diff;

use async_trait::async_trait;
use std::sync::Arc;
use zonesync_core::config::{BackendConfig, CloudflareConfig, DEFAULT_CLOUDFLARE_API_BASE, ProviderConfig};
use zonesync_core::record::{RecordContent, build_rrset};
use zonesync_core::traits::{DnsProvider, DnsProviderFactory};
use zonesync_core::{DomainName, Error, FactoryRegistry, RecordSpec, RecordType, Result};

pub use api::{Auth, CloudflareApi, CloudflareClient, DnsRecord};
pub use cache::ZoneIdCache;
pub use diff::{RecordDiff, compute_diff};

/// Annotation overriding the provider's proxied default for one record
pub const PROXIED_ANNOTATION: &str = "zonesync.io/cloudflare-proxied";

/// TTL value meaning "automatic"
pub const AUTO_TTL: u32 = 1;

/// Cloudflare DNS provider
pub struct CloudflareProvider {
    zones: Vec<DomainName>,
    api: Arc<dyn CloudflareApi>,
    proxied_by_default: bool,
    zone_ids: ZoneIdCache,
}

impl CloudflareProvider {
    /// Create a provider over any API implementation
    pub fn new(zones: Vec<DomainName>, api: Arc<dyn CloudflareApi>, proxied_by_default: bool) -> Self {
        Self {
            zones,
            api,
            proxied_by_default,
            zone_ids: ZoneIdCache::new(),
        }
    }

    /// Build a provider backed by the HTTP client
    pub fn from_config(zones: Vec<DomainName>, config: &CloudflareConfig) -> Result<Self> {
        let auth = auth_from_config(config)?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_CLOUDFLARE_API_BASE.to_string());
        let client = CloudflareClient::new(base_url, auth)?;

        Ok(Self::new(zones, Arc::new(client), config.proxied_by_default))
    }

    /// Drop the cached id of `zone`, forcing a lookup on next use
    pub fn invalidate_zone_id(&self, zone: &DomainName) -> bool {
        self.zone_ids.invalidate(zone)
    }

    async fn zone_id(&self, zone: &DomainName) -> Result<String> {
        if let Some(id) = self.zone_ids.get(zone) {
            return Ok(id);
        }

        let id = self.api.zone_id(zone.trim_root()).await.inspect_err(|e| {
            tracing::error!("Could not resolve zone {}: {}", zone, e);
        })?;
        self.zone_ids.insert(zone, id.clone());
        Ok(id)
    }

    /// Proxied flag for `record`: annotation first, then the provider default
    fn proxied_for(&self, record: &RecordSpec) -> bool {
        match record.annotations.get(PROXIED_ANNOTATION) {
            Some(value) => parse_bool(value).unwrap_or_else(|| {
                tracing::warn!(
                    "Ignoring invalid {} value {:?} on {}",
                    PROXIED_ANNOTATION,
                    value,
                    record.name
                );
                self.proxied_by_default
            }),
            None => self.proxied_by_default,
        }
    }

    /// Cloudflare records equivalent to `record`
    pub fn desired_records(&self, record: &RecordSpec) -> Result<Vec<DnsRecord>> {
        let record_type = record.validate()?;
        let ttl = record.ttl.unwrap_or(AUTO_TTL);
        let proxied = proxiable(record_type) && self.proxied_for(record);
        let name = record.name.trim_root();

        build_rrset(record)?
            .into_iter()
            .map(|rr| -> Result<DnsRecord> {
                let (content, priority) = match rr.content {
                    RecordContent::A(ip) => (ip.to_string(), None),
                    RecordContent::Aaaa(ip) => (ip.to_string(), None),
                    RecordContent::Cname(target) => (target.trim_root().to_string(), None),
                    // Cloudflare takes the unsplit string
                    RecordContent::Txt(segments) => {
                        let text = String::from_utf8(segments.concat())
                            .map_err(|e| Error::unsupported(format!("TXT is not UTF-8: {e}")))?;
                        (text, None)
                    }
                    RecordContent::Mx {
                        preference,
                        exchange,
                    } => (exchange.trim_root().to_string(), Some(preference)),
                };
                Ok(DnsRecord::new(
                    record_type.as_str(),
                    name,
                    content,
                    ttl,
                    proxied,
                    priority,
                ))
            })
            .collect()
    }
}

// Custom Debug implementation that hides the API credentials
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("zones", &self.zones)
            .field("proxied_by_default", &self.proxied_by_default)
            .field("cached_zone_ids", &self.zone_ids.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    fn zones(&self) -> &[DomainName] {
        &self.zones
    }

    async fn upsert(&self, zone: &DomainName, record: &RecordSpec) -> Result<()> {
        let record_type = record.validate()?;
        let desired = self.desired_records(record)?;
        let zone_id = self.zone_id(zone).await?;

        let present = self
            .api
            .list_records(&zone_id, record.name.trim_root(), record_type.as_str())
            .await?;
        let diff = compute_diff(present, desired);

        if diff.is_empty() {
            tracing::debug!("{} {} already up to date", record.name, record_type);
            return Ok(());
        }

        for stale in &diff.to_delete {
            let id = record_id(stale)?;
            tracing::debug!("Deleting old DNS record {} ({})", id, stale.content);
            self.api.delete_record(&zone_id, id).await?;
        }
        for missing in &diff.to_create {
            tracing::debug!("Creating DNS record {} -> {}", missing.name, missing.content);
            self.api.create_record(&zone_id, missing).await?;
        }

        tracing::info!(
            "Updated {} {} in zone {} ({} created, {} deleted)",
            record.name,
            record_type,
            zone,
            diff.to_create.len(),
            diff.to_delete.len()
        );
        Ok(())
    }

    async fn delete(&self, zone: &DomainName, record: &RecordSpec) -> Result<()> {
        let record_type = record.record_type()?;
        let zone_id = self.zone_id(zone).await?;

        let present = self
            .api
            .list_records(&zone_id, record.name.trim_root(), record_type.as_str())
            .await?;

        for stale in &present {
            let id = record_id(stale)?;
            tracing::debug!("Deleting DNS record {} ({})", id, stale.content);
            self.api.delete_record(&zone_id, id).await?;
        }

        tracing::info!(
            "Deleted {} {} record(s) for {} in zone {}",
            present.len(),
            record_type,
            record.name,
            zone
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match &config.backend {
            BackendConfig::Cloudflare(cf) => Ok(Box::new(CloudflareProvider::from_config(
                config.zones.clone(),
                cf,
            )?)),
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a factory registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::FactoryRegistry;
///
/// let registry = FactoryRegistry::new();
/// zonesync_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &FactoryRegistry) {
    registry.register_provider("cloudflare", Box::new(CloudflareFactory));
}

/// Pick the credential: a token wins, otherwise key plus email
pub fn auth_from_config(config: &CloudflareConfig) -> Result<Auth> {
    let non_empty = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();

    if let Some(token) = non_empty(&config.api_token) {
        return Ok(Auth::Token(token));
    }

    match (non_empty(&config.api_key), non_empty(&config.email)) {
        (Some(key), Some(email)) => Ok(Auth::Key { key, email }),
        (Some(_), None) => Err(Error::missing_credential(
            "email is required when authenticating with an API key",
        )),
        (None, _) => Err(Error::missing_credential(
            "one of api_token or api_key is required",
        )),
    }
}

fn proxiable(record_type: RecordType) -> bool {
    matches!(record_type, RecordType::A | RecordType::Aaaa | RecordType::Cname)
}

fn record_id(record: &DnsRecord) -> Result<&str> {
    record.id.as_deref().ok_or_else(|| {
        Error::protocol(
            "cloudflare",
            "invalid-response",
            format!("record {} has no id", record.name),
        )
    })
}

/// Boolean spellings accepted in annotations
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
