//! Zone name → Cloudflare zone id cache
//!
//! Filled lazily by the provider. Entries are never evicted on their own;
//! `invalidate` and `clear` exist for callers that learn a zone was
//! recreated on the Cloudflare side.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use zonesync_core::DomainName;

#[derive(Debug, Default)]
pub struct ZoneIdCache {
    ids: RwLock<HashMap<String, String>>,
}

impl ZoneIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, zone: &DomainName) -> Option<String> {
        let ids = self.ids.read().unwrap_or_else(PoisonError::into_inner);
        ids.get(&key(zone)).cloned()
    }

    pub fn insert(&self, zone: &DomainName, id: impl Into<String>) {
        let mut ids = self.ids.write().unwrap_or_else(PoisonError::into_inner);
        ids.insert(key(zone), id.into());
    }

    /// Forget the id of one zone; returns whether it was cached
    pub fn invalidate(&self, zone: &DomainName) -> bool {
        let mut ids = self.ids.write().unwrap_or_else(PoisonError::into_inner);
        ids.remove(&key(zone)).is_some()
    }

    pub fn clear(&self) {
        self.ids.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.ids.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// "Example.com." and "example.com" name the same zone
fn key(zone: &DomainName) -> String {
    zone.trim_root().to_ascii_lowercase()
}
