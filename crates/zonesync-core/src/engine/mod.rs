//! Reconciliation engine
//!
//! The `Reconciler` takes one desired record at a time and drives it
//! into the provider that manages it:
//!
//! ```text
//! ┌──────────────┐   id    ┌──────────────────┐
//! │ RecordSpec   │────────▶│ ProviderRegistry │
//! └──────────────┘         └──────────────────┘
//!        │                          │ Arc<dyn DnsProvider>
//!        ▼                          ▼
//! ┌──────────────┐  zones  ┌──────────────────┐
//! │ validate     │────────▶│ find_owning_zone │
//! └──────────────┘         └──────────────────┘
//!                                   │ zone
//!                                   ▼
//!                          ┌──────────────────┐
//!                          │ upsert / delete  │
//!                          └──────────────────┘
//! ```
//!
//! ## Scope
//!
//! The engine decides neither when to run nor whether to retry. Each call
//! is a single attempt; cadence and backoff belong to the caller, which
//! can use [`crate::Error::is_retriable`] to tell transient failures from
//! permanent ones.

use crate::config::{Ensure, ManagedRecord};
use crate::error::{Error, Result};
use crate::name::DomainName;
use crate::record::{DeletionPolicy, RecordSpec, build_rrset};
use crate::registry::ProviderRegistry;
use crate::traits::DnsProvider;
use crate::zone::find_owning_zone;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a successful reconcile call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The RRset was written to the zone
    Applied { zone: DomainName },

    /// The RRset was removed from the zone
    Removed { zone: DomainName },

    /// Removal skipped because of `DeletionPolicy::Retain`
    Retained,

    /// Dry-run: everything was checked but the provider was not called
    Skipped { zone: DomainName },
}

/// Drives desired records into the providers of a registry
pub struct Reconciler {
    registry: Arc<ProviderRegistry>,
    dry_run: bool,
}

impl Reconciler {
    /// Create a reconciler over `registry`
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            dry_run: false,
        }
    }

    /// In dry-run mode names, zones and payloads are validated but no
    /// provider operation runs
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The registry this reconciler reads from
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Make the provider's backend hold exactly `spec`
    pub async fn apply(&self, provider_id: &str, spec: &RecordSpec) -> Result<ReconcileOutcome> {
        let (provider, zone) = self.prepare(provider_id, spec)?;

        if self.dry_run {
            let rrset = build_rrset(spec)?;
            info!(
                "[DRY-RUN] Would upsert {} record(s) for {} in zone {} via {}",
                rrset.len(),
                spec.name,
                zone,
                provider_id
            );
            return Ok(ReconcileOutcome::Skipped { zone });
        }

        debug!("Upserting {} in zone {} via {}", spec.name, zone, provider_id);
        provider.upsert(&zone, spec).await?;
        info!("Successfully updated record {} in zone {}", spec.name, zone);

        Ok(ReconcileOutcome::Applied { zone })
    }

    /// Remove `spec`'s RRset from the provider's backend, unless retained
    pub async fn remove(
        &self,
        provider_id: &str,
        spec: &RecordSpec,
        policy: DeletionPolicy,
    ) -> Result<ReconcileOutcome> {
        if policy == DeletionPolicy::Retain {
            info!("Retaining record {} (deletion policy)", spec.name);
            return Ok(ReconcileOutcome::Retained);
        }

        let (provider, zone) = self.prepare(provider_id, spec)?;

        if self.dry_run {
            info!(
                "[DRY-RUN] Would delete {} in zone {} via {}",
                spec.name, zone, provider_id
            );
            return Ok(ReconcileOutcome::Skipped { zone });
        }

        debug!("Deleting {} in zone {} via {}", spec.name, zone, provider_id);
        provider.delete(&zone, spec).await?;
        info!("Record {} deleted from zone {}", spec.name, zone);

        Ok(ReconcileOutcome::Removed { zone })
    }

    /// Reconcile one entry of a desired-state document
    pub async fn reconcile(&self, record: &ManagedRecord) -> Result<ReconcileOutcome> {
        match record.ensure {
            Ensure::Present => self.apply(&record.provider, &record.spec).await,
            Ensure::Absent => {
                self.remove(&record.provider, &record.spec, record.deletion_policy)
                    .await
            }
        }
    }

    fn prepare(
        &self,
        provider_id: &str,
        spec: &RecordSpec,
    ) -> Result<(Arc<dyn DnsProvider>, DomainName)> {
        let provider = self
            .registry
            .get(provider_id)
            .ok_or_else(|| Error::ProviderNotFound(provider_id.to_string()))?;

        let zone = find_owning_zone(provider.zones(), &spec.name)?.clone();
        spec.validate()?;

        Ok((provider, zone))
    }
}
