//! Test doubles and common utilities for contract tests
//!
//! The doubles record what they were asked to do and never talk to a
//! real backend.

#![allow(dead_code)]

use zonesync_core::error::{Error, Result};
use zonesync_core::record::RecordData;
use zonesync_core::traits::DnsProvider;
use zonesync_core::{DomainName, RecordSpec};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One provider call as seen by [`RecordingProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upsert { zone: String, name: String },
    Delete { zone: String, name: String },
}

/// A DnsProvider that records every call
pub struct RecordingProvider {
    zones: Vec<DomainName>,
    calls: Arc<Mutex<Vec<Call>>>,
    /// Fail every call with this error message, as a transport failure
    fail_with: Option<String>,
    /// Delay applied inside each call
    delay: Option<Duration>,
    /// Label returned by provider_name()
    pub name: &'static str,
}

impl RecordingProvider {
    pub fn new(zones: &[&str]) -> Self {
        Self {
            zones: zones.iter().map(|z| zone(z)).collect(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            delay: None,
            name: "recording",
        }
    }

    /// Make every call fail with a retriable transport error
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Make every call take at least `delay`
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Handle onto the call log, usable after the provider moved into a registry
    pub fn calls_handle(&self) -> Arc<Mutex<Vec<Call>>> {
        Arc::clone(&self.calls)
    }

    async fn record(&self, call: Call) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push(call);

        match &self.fail_with {
            Some(message) => Err(Error::transport("recording", message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for RecordingProvider {
    fn zones(&self) -> &[DomainName] {
        &self.zones
    }

    async fn upsert(&self, zone: &DomainName, record: &RecordSpec) -> Result<()> {
        self.record(Call::Upsert {
            zone: zone.to_string(),
            name: record.name.to_string(),
        })
        .await
    }

    async fn delete(&self, zone: &DomainName, record: &RecordSpec) -> Result<()> {
        self.record(Call::Delete {
            zone: zone.to_string(),
            name: record.name.to_string(),
        })
        .await
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }
}

/// A provider whose calls are only counted
pub struct CountingProvider {
    zones: Vec<DomainName>,
    count: Arc<AtomicUsize>,
    pub name: &'static str,
}

impl CountingProvider {
    pub fn new(name: &'static str, count: Arc<AtomicUsize>) -> Self {
        Self {
            zones: vec![zone("example.com.")],
            count,
            name,
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for CountingProvider {
    fn zones(&self) -> &[DomainName] {
        &self.zones
    }

    async fn upsert(&self, _zone: &DomainName, _record: &RecordSpec) -> Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, _zone: &DomainName, _record: &RecordSpec) -> Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }
}

pub fn zone(name: &str) -> DomainName {
    DomainName::parse(name).expect("valid zone name")
}

/// A single-address A record for `name`
pub fn a_record(name: &str) -> RecordSpec {
    RecordSpec::new(
        DomainName::parse(name).expect("valid owner name"),
        RecordData::a(["192.0.2.10"]),
    )
}
