//! Dynamic Update message construction
//!
//! An upsert is one message whose update section first deletes the whole
//! RRset for (owner, type) and then adds every record of the desired set.
//! The server applies a message atomically. A delete is the first half
//! alone.

use hickory_client::op::{Message, MessageType, OpCode, Query, UpdateMessage};
use hickory_client::rr::rdata::{self, CNAME, MX, TXT};
use hickory_client::rr::{DNSClass, Name, RData, Record, RecordType as WireType};
use std::str::FromStr;
use zonesync_core::record::{RecordContent, RecordType, ResourceRecord};
use zonesync_core::{DomainName, Error, Result};

/// Message replacing the RRset of `owner`/`record_type` with `records`
pub fn upsert_message(
    zone: &DomainName,
    owner: &DomainName,
    record_type: RecordType,
    records: &[ResourceRecord],
) -> Result<Message> {
    let mut message = update_message(zone)?;
    message.add_update(delete_rrset_record(owner, record_type)?);
    for record in records {
        message.add_update(to_wire(record)?);
    }
    Ok(message)
}

/// Message removing the RRset of `owner`/`record_type`
pub fn delete_message(zone: &DomainName, owner: &DomainName, record_type: RecordType) -> Result<Message> {
    let mut message = update_message(zone)?;
    message.add_update(delete_rrset_record(owner, record_type)?);
    Ok(message)
}

fn update_message(zone: &DomainName) -> Result<Message> {
    let mut query = Query::new();
    query
        .set_name(wire_name(zone)?)
        .set_query_class(DNSClass::IN)
        .set_query_type(WireType::SOA);

    // The transport assigns the message id
    let mut message = Message::new();
    message
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Update)
        .set_recursion_desired(false);
    message.add_zone(query);
    Ok(message)
}

// RFC2136 2.5.2: class ANY, TTL 0, empty RDATA deletes an RRset
fn delete_rrset_record(owner: &DomainName, record_type: RecordType) -> Result<Record> {
    let mut record = Record::with(wire_name(owner)?, wire_type(record_type), 0);
    record.set_dns_class(DNSClass::ANY);
    Ok(record)
}

fn to_wire(record: &ResourceRecord) -> Result<Record> {
    let rdata = match &record.content {
        RecordContent::A(ip) => RData::A(rdata::A::from(*ip)),
        RecordContent::Aaaa(ip) => RData::AAAA(rdata::AAAA::from(*ip)),
        RecordContent::Cname(target) => RData::CNAME(CNAME(wire_name(target)?)),
        RecordContent::Txt(segments) => {
            RData::TXT(TXT::from_bytes(segments.iter().map(Vec::as_slice).collect()))
        }
        RecordContent::Mx {
            preference,
            exchange,
        } => RData::MX(MX::new(*preference, wire_name(exchange)?)),
    };

    let mut wire = Record::from_rdata(wire_name(&record.name)?, record.ttl, rdata);
    wire.set_dns_class(DNSClass::IN);
    Ok(wire)
}

fn wire_type(record_type: RecordType) -> WireType {
    match record_type {
        RecordType::A => WireType::A,
        RecordType::Aaaa => WireType::AAAA,
        RecordType::Cname => WireType::CNAME,
        RecordType::Txt => WireType::TXT,
        RecordType::Mx => WireType::MX,
    }
}

fn wire_name(name: &DomainName) -> Result<Name> {
    Name::from_str(name.to_fqdn().as_str())
        .map_err(|e| Error::invalid_name(format!("{name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonesync_core::record::build_rrset;
    use zonesync_core::{RecordData, RecordSpec};

    fn name(s: &str) -> DomainName {
        DomainName::parse(s).unwrap()
    }

    #[test]
    fn test_upsert_deletes_then_adds() {
        let spec = RecordSpec::new(name("www.example.com"), RecordData::a(["192.0.2.1", "192.0.2.2"]))
            .with_ttl(300);
        let rrset = build_rrset(&spec).unwrap();

        let message =
            upsert_message(&name("example.com"), &spec.name, RecordType::A, &rrset).unwrap();

        assert_eq!(message.op_code(), OpCode::Update);
        assert_eq!(message.zones().len(), 1);
        assert_eq!(message.zones()[0].name().to_string(), "example.com.");
        assert_eq!(message.zones()[0].query_type(), WireType::SOA);

        let updates = message.updates();
        assert_eq!(updates.len(), 3);

        assert_eq!(updates[0].dns_class(), DNSClass::ANY);
        assert_eq!(updates[0].record_type(), WireType::A);
        assert_eq!(updates[0].ttl(), 0);
        assert!(updates[0].data().is_none());

        for update in &updates[1..] {
            assert_eq!(update.dns_class(), DNSClass::IN);
            assert_eq!(update.ttl(), 300);
            assert_eq!(update.name().to_string(), "www.example.com.");
        }
        assert_eq!(
            updates[1].data(),
            Some(&RData::A(rdata::A::from("192.0.2.1".parse::<std::net::Ipv4Addr>().unwrap())))
        );
    }

    #[test]
    fn test_delete_only_removes_rrset() {
        let message = delete_message(&name("example.com."), &name("mail.example.com"), RecordType::Mx)
            .unwrap();

        let updates = message.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].dns_class(), DNSClass::ANY);
        assert_eq!(updates[0].record_type(), WireType::MX);
    }

    #[test]
    fn test_identical_specs_give_identical_updates() {
        let spec = RecordSpec::new(name("txt.example.com"), RecordData::txt(["a".repeat(600)]));
        let rrset = build_rrset(&spec).unwrap();

        let first = upsert_message(&name("example.com"), &spec.name, RecordType::Txt, &rrset).unwrap();
        let second = upsert_message(&name("example.com"), &spec.name, RecordType::Txt, &rrset).unwrap();

        assert_eq!(first.zones(), second.zones());
        assert_eq!(first.updates(), second.updates());
    }

    #[test]
    fn test_long_txt_is_split_into_segments() {
        let spec = RecordSpec::new(name("txt.example.com"), RecordData::txt(["b".repeat(600)]));
        let rrset = build_rrset(&spec).unwrap();
        let message = upsert_message(&name("example.com"), &spec.name, RecordType::Txt, &rrset).unwrap();

        match message.updates()[1].data() {
            Some(RData::TXT(txt)) => {
                let lengths: Vec<usize> = txt.txt_data().iter().map(|s| s.len()).collect();
                assert_eq!(lengths, vec![255, 255, 90]);
            }
            other => panic!("unexpected rdata: {other:?}"),
        }
    }

    #[test]
    fn test_targets_are_fully_qualified() {
        let spec = RecordSpec::new(
            name("alias.example.com"),
            RecordData::cname(name("target.example.net")),
        );
        let rrset = build_rrset(&spec).unwrap();
        let message =
            upsert_message(&name("example.com"), &spec.name, RecordType::Cname, &rrset).unwrap();

        match message.updates()[1].data() {
            Some(RData::CNAME(target)) => assert_eq!(target.0.to_string(), "target.example.net."),
            other => panic!("unexpected rdata: {other:?}"),
        }
    }
}
