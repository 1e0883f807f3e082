//! Leaf endpoint resolution against the relay tree.
//!
//! Upstream references come in as free text: a relay name with a port
//! suffix, a fully-qualified hostname, or a bare IP address. Resolution is
//! cascading, first success wins: exact name > IP index > override map.

use std::net::IpAddr;

use crate::models::{strip_port_suffix, Record};
use crate::overrides::OverrideMap;
use crate::topology::builder::Topology;

/// Outcome of resolving one leaf's upstream reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Name of the owning relay.
    Resolved(String),
    /// Nothing matched; carries the normalized candidate for diagnostics.
    Unresolved(String),
}

/// Derive the lookup candidate from a raw upstream reference.
///
/// The port suffix is always stripped. IP literals are kept whole; hostnames
/// with a domain suffix are truncated at the first `.` so they can match the
/// short relay names the inventory reports.
pub fn candidate_name(upstream_ref: &str) -> String {
    let stripped = strip_port_suffix(upstream_ref);
    if stripped.parse::<IpAddr>().is_ok() {
        return stripped.to_string();
    }
    match stripped.find('.') {
        Some(dot) if dot > 0 => stripped[..dot].to_string(),
        _ => stripped.to_string(),
    }
}

/// Resolve one leaf record to its owning relay.
///
/// Lookup order: exact relay-name match, then the IP index, then the
/// override map (whose target must itself name a known relay).
pub fn resolve_endpoint(
    leaf: &Record,
    topology: &Topology,
    overrides: &OverrideMap,
) -> Resolution {
    let candidate = candidate_name(&leaf.upstream_ref);

    if topology.relays.contains_key(&candidate) {
        return Resolution::Resolved(candidate);
    }
    if let Some(owner) = topology.ip_index.get(&candidate) {
        return Resolution::Resolved(owner.clone());
    }
    if let Some(mapped) = overrides.get(&candidate) {
        if topology.relays.contains_key(mapped) {
            return Resolution::Resolved(mapped.to_string());
        }
    }

    Resolution::Unresolved(candidate)
}
