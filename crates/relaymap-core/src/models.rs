//! Shared typed models used across the topology, snapshot, and graph layers.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{MapError, MapResult};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default report port for fleet-management deployments.
pub const DEFAULT_PORT: u16 = 52311;

/// Inventory property used for grouping when none is requested.
pub const DEFAULT_GROUP_PROPERTY: &str = "Subnet Address";

/// Separator used by the inventory server to join multi-valued fields.
pub const FIELD_SEPARATOR: char = '|';

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Role of an inventory record in the relay hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Root,
    Relay,
    Endpoint,
}

/// One normalized inventory entry.
///
/// Wire rows are positional arrays:
/// `[id, name, lastReportTime, isRelay, isRoot, upstreamRef, "ip|ip", "grp|grp"]`.
/// Names are lowercase; relay/root names are unique, endpoint names are not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub last_report_time: String,
    pub is_relay: bool,
    pub is_root: bool,
    pub upstream_ref: String,
    pub ip_addresses: Vec<String>,
    pub group_values: Vec<String>,
}

impl Record {
    /// Parse one positional wire row as returned by the inventory query.
    pub fn from_row(row: &Value) -> MapResult<Self> {
        let fields = row
            .as_array()
            .ok_or_else(|| MapError::Source(format!("record row is not an array: {row}")))?;
        if fields.len() != 8 {
            return Err(MapError::Source(format!(
                "record row has {} fields, expected 8: {row}",
                fields.len()
            )));
        }

        Ok(Self {
            id: fields[0]
                .as_i64()
                .ok_or_else(|| MapError::Source(format!("record id is not an integer: {row}")))?,
            name: string_field(&fields[1]),
            last_report_time: string_field(&fields[2]),
            is_relay: fields[3].as_bool().unwrap_or(false),
            is_root: fields[4].as_bool().unwrap_or(false),
            upstream_ref: string_field(&fields[5]),
            ip_addresses: split_joined(&string_field(&fields[6])),
            group_values: split_joined(&string_field(&fields[7])),
        })
    }

    pub fn role(&self) -> Role {
        if self.is_root {
            Role::Root
        } else if self.is_relay {
            Role::Relay
        } else {
            Role::Endpoint
        }
    }
}

fn string_field(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Split a `|`-joined multi-valued field. An empty field carries no values.
pub fn split_joined(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined
        .split(FIELD_SEPARATOR)
        .map(str::to_string)
        .collect()
}

/// Strip a trailing `:<port>` suffix from an upstream reference, if present.
///
/// Only a purely numeric suffix is treated as a port. A bare IP literal is
/// returned unchanged, which keeps IPv6 addresses (whose groups would
/// otherwise look like a port) intact.
pub fn strip_port_suffix(upstream_ref: &str) -> &str {
    if upstream_ref.parse::<std::net::IpAddr>().is_ok() {
        return upstream_ref;
    }
    match upstream_ref.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => upstream_ref,
    }
}

// ---------------------------------------------------------------------------
// Relay tree
// ---------------------------------------------------------------------------

/// Per-relay, per-group-value accumulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupBucket {
    /// Endpoint-assignment count. A multi-homed leaf counts once per bucket.
    pub count: u64,
    pub members: Vec<Record>,
}

/// One vertex of the relay tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayNode {
    pub record: Record,
    /// Resolved name of the parent relay. The root is its own parent.
    pub parent: String,
    /// Starts at 1 (the relay counts itself), +1 per resolved leaf.
    pub unique_endpoints: u64,
    pub groups: IndexMap<String, GroupBucket>,
}

impl RelayNode {
    pub fn new(record: Record, parent: String) -> Self {
        Self {
            record,
            parent,
            unique_endpoints: 1,
            groups: IndexMap::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.record.is_root
    }
}

/// Relay name → node. Iteration order is imposed by the pipeline's finalize
/// step so that emission is deterministic.
pub type RelayTable = IndexMap<String, RelayNode>;

/// IP address string → owning relay name.
pub type IpIndex = HashMap<String, String>;

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Run-identifying configuration persisted alongside the relay table.
///
/// This is everything the graph emitter needs that is not derivable from the
/// tree itself, so a decoded snapshot is indistinguishable from a live run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub server: String,
    pub port: u16,
    pub group_property: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: DEFAULT_PORT,
            group_property: DEFAULT_GROUP_PROPERTY.to_string(),
        }
    }
}

/// A fully resolved deployment: the relay tree plus its run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub relays: RelayTable,
    pub config: RunConfig,
}

#[cfg(test)]
pub mod test_support {
    //! Record fixtures shared by unit tests across the crate.

    use super::Record;

    fn base(id: i64, name: &str, upstream_ref: &str) -> Record {
        Record {
            id,
            name: name.to_string(),
            last_report_time: "Mon, 01 Jan 2024 00:00:00 +0000".to_string(),
            is_relay: false,
            is_root: false,
            upstream_ref: upstream_ref.to_string(),
            ip_addresses: Vec::new(),
            group_values: Vec::new(),
        }
    }

    pub fn root(name: &str, ips: &[&str]) -> Record {
        let mut rec = base(1, name, name);
        rec.is_root = true;
        rec.ip_addresses = ips.iter().map(|s| s.to_string()).collect();
        rec
    }

    pub fn relay(name: &str, upstream_ref: &str, ips: &[&str]) -> Record {
        let mut rec = base(2, name, upstream_ref);
        rec.is_relay = true;
        rec.ip_addresses = ips.iter().map(|s| s.to_string()).collect();
        rec
    }

    pub fn endpoint(id: i64, name: &str, upstream_ref: &str, groups: &[&str]) -> Record {
        let mut rec = base(id, name, upstream_ref);
        rec.group_values = groups.iter().map(|s| s.to_string()).collect();
        rec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_row_parses_all_fields() {
        let row = json!([
            12345,
            "relay1",
            "Mon, 01 Jan 2024 00:00:00 +0000",
            true,
            false,
            "root.example.com:52311",
            "10.0.0.5|fe80::1",
            "10.0.0.0/24"
        ]);
        let rec = Record::from_row(&row).unwrap();
        assert_eq!(rec.id, 12345);
        assert_eq!(rec.name, "relay1");
        assert_eq!(rec.role(), Role::Relay);
        assert_eq!(rec.upstream_ref, "root.example.com:52311");
        assert_eq!(rec.ip_addresses, vec!["10.0.0.5", "fe80::1"]);
        assert_eq!(rec.group_values, vec!["10.0.0.0/24"]);
    }

    #[test]
    fn test_from_row_empty_multivalue_fields() {
        let row = json!([1, "ep1", "t", false, false, "relay1:52311", "", ""]);
        let rec = Record::from_row(&row).unwrap();
        assert_eq!(rec.role(), Role::Endpoint);
        assert!(rec.ip_addresses.is_empty());
        assert!(rec.group_values.is_empty());
    }

    #[test]
    fn test_from_row_rejects_short_rows() {
        let row = json!([1, "ep1", "t"]);
        assert!(Record::from_row(&row).is_err());
    }

    #[test]
    fn test_strip_port_suffix() {
        assert_eq!(strip_port_suffix("relay1:52311"), "relay1");
        assert_eq!(strip_port_suffix("10.0.0.5:52311"), "10.0.0.5");
        assert_eq!(strip_port_suffix("relay1"), "relay1");
        // Not a numeric port: leave the reference alone.
        assert_eq!(strip_port_suffix("relay1:abc"), "relay1:abc");
        assert_eq!(strip_port_suffix("relay1:"), "relay1:");
        // IPv6 groups are not ports.
        assert_eq!(strip_port_suffix("fe80::1"), "fe80::1");
    }

    #[test]
    fn test_split_joined() {
        assert_eq!(split_joined("a|b"), vec!["a", "b"]);
        assert_eq!(split_joined("a"), vec!["a"]);
        assert!(split_joined("").is_empty());
    }
}
