// # RRset construction
//
// Turns a `RecordSpec` into one `ResourceRecord` per payload element.
// All records of a set share the owner (always fully qualified), the
// class and the TTL. Construction is all-or-nothing: a single bad element
// fails the whole set and nothing is emitted.
//
// Encoding rules:
// - A/AAAA literals must parse as the matching address family
// - CNAME and MX targets are made fully qualified
// - TXT strings are split into segments of at most 255 bytes, the limit
//   of a single character-string on the wire

use super::{RecordSpec, RecordType};
use crate::error::{Error, Result};
use crate::name::DomainName;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Maximum length of one TXT character-string
pub const MAX_TXT_SEGMENT_LEN: usize = 255;

/// DNS class of a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RecordClass {
    /// Internet
    #[default]
    In,
}

/// Type-specific record data, already in wire-ready form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordContent {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(DomainName),
    /// Segments of one text string, each at most 255 bytes
    Txt(Vec<Vec<u8>>),
    Mx {
        preference: u16,
        exchange: DomainName,
    },
}

impl RecordContent {
    /// Record type of this content
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordContent::A(_) => RecordType::A,
            RecordContent::Aaaa(_) => RecordType::Aaaa,
            RecordContent::Cname(_) => RecordType::Cname,
            RecordContent::Txt(_) => RecordType::Txt,
            RecordContent::Mx { .. } => RecordType::Mx,
        }
    }
}

/// A protocol-level resource record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Owner name, always fully qualified
    pub name: DomainName,
    pub class: RecordClass,
    pub ttl: u32,
    pub content: RecordContent,
}

impl ResourceRecord {
    /// Record type of this record
    pub fn record_type(&self) -> RecordType {
        self.content.record_type()
    }
}

/// Build the resource records for a spec
pub fn build_rrset(spec: &RecordSpec) -> Result<Vec<ResourceRecord>> {
    let record_type = spec.validate()?;
    let data = &spec.data;

    let contents: Vec<RecordContent> = match record_type {
        RecordType::A => data
            .a
            .iter()
            .flatten()
            .map(|literal| parse_ipv4(literal).map(RecordContent::A))
            .collect::<Result<_>>()?,
        RecordType::Aaaa => data
            .aaaa
            .iter()
            .flatten()
            .map(|literal| parse_ipv6(literal).map(RecordContent::Aaaa))
            .collect::<Result<_>>()?,
        RecordType::Cname => data
            .cname
            .iter()
            .flatten()
            .map(|target| RecordContent::Cname(target.to_fqdn()))
            .collect(),
        RecordType::Txt => data
            .txt
            .iter()
            .flatten()
            .map(|text| RecordContent::Txt(txt_segments(text)))
            .collect(),
        RecordType::Mx => data
            .mx
            .iter()
            .flatten()
            .map(|mx| RecordContent::Mx {
                preference: mx.preference,
                exchange: mx.host.to_fqdn(),
            })
            .collect(),
    };

    let owner = spec.name.to_fqdn();
    let ttl = spec.ttl();

    Ok(contents
        .into_iter()
        .map(|content| ResourceRecord {
            name: owner.clone(),
            class: RecordClass::In,
            ttl,
            content,
        })
        .collect())
}

/// Split a text string into wire segments of at most 255 bytes
///
/// The concatenation of the segments is always the original string. An
/// empty string yields a single empty segment.
pub fn txt_segments(text: &str) -> Vec<Vec<u8>> {
    if text.is_empty() {
        return vec![Vec::new()];
    }
    text.as_bytes()
        .chunks(MAX_TXT_SEGMENT_LEN)
        .map(<[u8]>::to_vec)
        .collect()
}

fn parse_ipv4(literal: &str) -> Result<Ipv4Addr> {
    literal
        .parse()
        .map_err(|_| Error::InvalidAddressLiteral {
            literal: literal.to_string(),
            expected: "IPv4",
        })
}

fn parse_ipv6(literal: &str) -> Result<Ipv6Addr> {
    literal
        .parse()
        .map_err(|_| Error::InvalidAddressLiteral {
            literal: literal.to_string(),
            expected: "IPv6",
        })
}
