//! Zone resolution
//!
//! Picks the zone a record belongs to out of the zones owned by a
//! provider. Like DNS delegation, the most specific zone wins: among all
//! zones the name is a child of, the one with the longest fully qualified
//! spelling is selected.

use crate::error::{Error, Result};
use crate::name::DomainName;

/// Find the zone owning `name`
///
/// Returns `Error::NoOwningZone` when no zone matches. Among zones of
/// equal length the first one in `zones` is kept.
pub fn find_owning_zone<'a>(zones: &'a [DomainName], name: &DomainName) -> Result<&'a DomainName> {
    let mut best: Option<(&DomainName, usize)> = None;

    for zone in zones.iter().filter(|zone| name.is_child_of(zone)) {
        let len = zone.to_fqdn().as_str().len();
        if best.is_none_or(|(_, best_len)| len > best_len) {
            best = Some((zone, len));
        }
    }

    best.map(|(zone, _)| zone)
        .ok_or_else(|| Error::no_owning_zone(name.as_str()))
}
