//! Core traits for zonesync
//!
//! - [`DnsProvider`]: reconcile RRsets against one DNS backend
//! - [`DnsProviderFactory`]: build providers from configuration

pub mod dns_provider;

pub use dns_provider::{DnsProvider, DnsProviderFactory};
