//! Desired record state
//!
//! A [`RecordSpec`] describes one RRset: the owner name, an optional TTL
//! and exactly one populated payload variant. Backends never look at the
//! payload directly for wire encoding; they go through [`build_rrset`].

mod rrset;

pub use rrset::{RecordClass, RecordContent, ResourceRecord, build_rrset, txt_segments};

use crate::error::{Error, Result};
use crate::name::DomainName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// TTL applied when a record does not set one
pub const DEFAULT_TTL_SECS: u32 = 3600;

/// Smallest accepted TTL
pub const MIN_TTL_SECS: u32 = 1;

/// Largest accepted TTL (one week)
pub const MAX_TTL_SECS: u32 = 604_800;

/// Record types understood by zonesync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Canonical name
    Cname,
    /// Free-form text
    Txt,
    /// Mail exchanger
    Mx,
}

impl RecordType {
    /// Wire/API mnemonic of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Mx => "MX",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One MX target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxData {
    /// Lower values are preferred
    pub preference: u16,
    /// Mail server host
    pub host: DomainName,
}

/// Typed payload of a record set
///
/// Exactly one field must be present and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aaaa: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname: Option<Vec<DomainName>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txt: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mx: Option<Vec<MxData>>,
}

impl RecordData {
    /// A payload of IPv4 literals
    pub fn a<I, S>(addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            a: Some(addrs.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// A payload of IPv6 literals
    pub fn aaaa<I, S>(addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aaaa: Some(addrs.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// A canonical-name payload
    pub fn cname(target: DomainName) -> Self {
        Self {
            cname: Some(vec![target]),
            ..Self::default()
        }
    }

    /// A payload of text strings
    pub fn txt<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            txt: Some(texts.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// A payload of mail exchangers
    pub fn mx(targets: Vec<MxData>) -> Self {
        Self {
            mx: Some(targets),
            ..Self::default()
        }
    }

    /// The record type selected by the single populated variant
    pub fn record_type(&self) -> Result<RecordType> {
        fn populated<T>(field: &Option<Vec<T>>) -> bool {
            field.as_ref().is_some_and(|v| !v.is_empty())
        }

        let present: Vec<RecordType> = [
            (populated(&self.a), RecordType::A),
            (populated(&self.aaaa), RecordType::Aaaa),
            (populated(&self.cname), RecordType::Cname),
            (populated(&self.txt), RecordType::Txt),
            (populated(&self.mx), RecordType::Mx),
        ]
        .into_iter()
        .filter_map(|(set, kind)| set.then_some(kind))
        .collect();

        match present.as_slice() {
            [kind] => Ok(*kind),
            [] => Err(Error::unsupported("record has no data")),
            _ => Err(Error::unsupported(format!(
                "record mixes several types: {}",
                present
                    .iter()
                    .map(RecordType::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// How removal of a managed record propagates to the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletionPolicy {
    /// Delete the RRset from the backend
    #[default]
    Delete,
    /// Leave the RRset in place
    Retain,
}

/// Desired state of one resource-record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Owner name
    pub name: DomainName,

    /// TTL in seconds, defaults to [`DEFAULT_TTL_SECS`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    /// Payload
    pub data: RecordData,

    /// Out-of-band metadata, never part of the record itself
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl RecordSpec {
    /// Create a spec with the default TTL and no annotations
    pub fn new(name: DomainName, data: RecordData) -> Self {
        Self {
            name,
            ttl: None,
            data,
            annotations: BTreeMap::new(),
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Attach an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Effective TTL
    pub fn ttl(&self) -> u32 {
        self.ttl.unwrap_or(DEFAULT_TTL_SECS)
    }

    /// Record type of the payload
    pub fn record_type(&self) -> Result<RecordType> {
        self.data.record_type()
    }

    /// Check TTL bounds and payload shape
    pub fn validate(&self) -> Result<RecordType> {
        let ttl = self.ttl();
        if !(MIN_TTL_SECS..=MAX_TTL_SECS).contains(&ttl) {
            return Err(Error::InvalidTtl(ttl));
        }
        self.record_type()
    }
}
