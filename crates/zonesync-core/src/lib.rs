// # zonesync-core
//
// Core library for reconciling a declared set of DNS records against
// live DNS backends.
//
// ## Architecture Overview
//
// - **DomainName**: validated domain name value and suffix matching
// - **Zone resolution**: longest-suffix selection of the owning zone
// - **RecordSpec**: desired state of one RRset, turned into wire-level
//   `ResourceRecord`s by `record::build_rrset`
// - **DnsProvider**: trait implemented by every backend (dummy, RFC2136, Cloudflare)
// - **FactoryRegistry**: type tag → provider factory table
// - **ProviderRegistry**: live provider instances keyed by an external id
// - **Reconciler**: registry lookup → zone resolution → provider dispatch
//
// ## Design Principles
//
// 1. **Single attempt**: providers never retry; retry policy is layered by callers
// 2. **Replace semantics**: `upsert` makes the backend RRset match the `RecordSpec` exactly
// 3. **Publish after construct**: a provider reaches the registry fully built or not at all
// 4. **Plugin-based**: backends register factories, no hard-coded if-else

pub mod config;
pub mod engine;
pub mod error;
pub mod name;
pub mod providers;
pub mod record;
pub mod registry;
pub mod traits;
pub mod zone;

// Re-export core types for convenience
pub use config::{BackendConfig, ProviderConfig, SyncConfig};
pub use engine::{ReconcileOutcome, Reconciler};
pub use error::{Error, Result};
pub use name::DomainName;
pub use record::{DeletionPolicy, RecordData, RecordSpec, RecordType, ResourceRecord};
pub use registry::{FactoryRegistry, ProviderRegistry};
pub use traits::{DnsProvider, DnsProviderFactory};
pub use zone::find_owning_zone;
