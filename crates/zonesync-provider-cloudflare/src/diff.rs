//! Desired vs present record sets
//!
//! A present record that exactly matches a desired one (type, name,
//! content, TTL, proxied flag, priority) is kept. Every other present
//! record is deleted and every unmatched desired record is created.
//! Changing only the TTL or the proxied flag therefore replaces the
//! record.

use crate::api::DnsRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDiff {
    pub to_create: Vec<DnsRecord>,
    pub to_delete: Vec<DnsRecord>,
}

impl RecordDiff {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Compute the calls that turn `present` into `desired`
///
/// Each present record consumes at most one desired record, so a
/// duplicated present record is deleted once its twin is matched.
pub fn compute_diff(present: Vec<DnsRecord>, desired: Vec<DnsRecord>) -> RecordDiff {
    let mut to_create = desired;
    let mut to_delete = Vec::new();

    for record in present {
        match to_create.iter().position(|wanted| same_record(wanted, &record)) {
            Some(index) => {
                to_create.remove(index);
            }
            None => to_delete.push(record),
        }
    }

    RecordDiff {
        to_create,
        to_delete,
    }
}

/// Attribute equality, ignoring the backend id
pub fn same_record(a: &DnsRecord, b: &DnsRecord) -> bool {
    a.record_type == b.record_type
        && a.name.eq_ignore_ascii_case(&b.name)
        && a.content == b.content
        && a.ttl == b.ttl
        && a.proxied == b.proxied
        && a.priority == b.priority
}
