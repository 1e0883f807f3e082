//! Relay tree construction from root/relay inventory records.

use tracing::debug;

use crate::errors::{MapError, MapResult};
use crate::models::{strip_port_suffix, IpIndex, Record, RelayNode, RelayTable, Role};
use crate::overrides::OverrideMap;

/// What to do when two relay records share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Surface the collision to the caller.
    #[default]
    Reject,
    /// Keep the last-seen record.
    Overwrite,
}

/// The relay tree plus the IP lookup structure the resolver consults.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub relays: RelayTable,
    pub ip_index: IpIndex,
}

/// Build the relay tree from records with the relay or root flag set.
///
/// Parent resolution: the root is its own parent; a relay's parent is its
/// upstream reference with any `:<port>` suffix stripped. Overrides are then
/// substituted. A parent name that never appears as a relay is tolerated and
/// later rendered as an edge to an unseen node.
pub fn build_topology(
    records: &[Record],
    overrides: &OverrideMap,
    policy: DuplicatePolicy,
) -> MapResult<Topology> {
    let mut topology = Topology::default();

    for record in records {
        let parent = match record.role() {
            Role::Root => record.name.clone(),
            Role::Relay => strip_port_suffix(&record.upstream_ref).to_string(),
            Role::Endpoint => continue,
        };
        let parent = match overrides.get(&parent) {
            Some(mapped) => mapped.to_string(),
            None => parent,
        };

        let node = RelayNode::new(record.clone(), parent);
        if topology.relays.contains_key(&record.name) {
            match policy {
                DuplicatePolicy::Reject => {
                    return Err(MapError::DuplicateRelay(record.name.clone()))
                }
                DuplicatePolicy::Overwrite => {
                    debug!(relay = %record.name, "duplicate relay record overwrites earlier one");
                }
            }
        }
        for ip in &record.ip_addresses {
            topology.ip_index.insert(ip.clone(), record.name.clone());
        }
        topology.relays.insert(record.name.clone(), node);
    }

    for (from, _) in overrides.iter() {
        if topology.relays.contains_key(from) {
            debug!(key = %from, "override key shadows a relay name; exact-name matches win");
        }
    }

    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{relay, root};

    #[test]
    fn test_root_is_its_own_parent() {
        let records = vec![root("bigfix-root", &["192.168.1.1"])];
        let topo = build_topology(&records, &OverrideMap::new(), DuplicatePolicy::Reject).unwrap();
        assert_eq!(topo.relays["bigfix-root"].parent, "bigfix-root");
        assert_eq!(topo.relays["bigfix-root"].unique_endpoints, 1);
    }

    #[test]
    fn test_relay_parent_strips_port_and_applies_override() {
        let records = vec![
            root("bigfix-root", &[]),
            relay("relay1", "bigfix-root:52311", &["10.0.0.5"]),
            relay("relay2", "old-name:52311", &[]),
        ];
        let overrides = OverrideMap::parse("old-name:relay1").unwrap();
        let topo = build_topology(&records, &overrides, DuplicatePolicy::Reject).unwrap();
        assert_eq!(topo.relays["relay1"].parent, "bigfix-root");
        assert_eq!(topo.relays["relay2"].parent, "relay1");
    }

    #[test]
    fn test_ip_index_covers_every_relay_address() {
        let records = vec![
            root("bigfix-root", &["192.168.1.1"]),
            relay("relay1", "bigfix-root:52311", &["10.0.0.5", "10.0.1.5"]),
        ];
        let topo = build_topology(&records, &OverrideMap::new(), DuplicatePolicy::Reject).unwrap();
        assert_eq!(topo.ip_index["192.168.1.1"], "bigfix-root");
        assert_eq!(topo.ip_index["10.0.0.5"], "relay1");
        assert_eq!(topo.ip_index["10.0.1.5"], "relay1");
    }

    #[test]
    fn test_dangling_parent_is_tolerated() {
        let records = vec![relay("relay1", "never-seen:52311", &[])];
        let topo = build_topology(&records, &OverrideMap::new(), DuplicatePolicy::Reject).unwrap();
        assert_eq!(topo.relays["relay1"].parent, "never-seen");
    }

    #[test]
    fn test_duplicate_relay_name_policy() {
        let records = vec![
            relay("relay1", "a:52311", &["10.0.0.1"]),
            relay("relay1", "b:52311", &["10.0.0.2"]),
        ];
        let err = build_topology(&records, &OverrideMap::new(), DuplicatePolicy::Reject);
        assert!(matches!(err, Err(MapError::DuplicateRelay(name)) if name == "relay1"));

        let topo =
            build_topology(&records, &OverrideMap::new(), DuplicatePolicy::Overwrite).unwrap();
        assert_eq!(topo.relays.len(), 1);
        assert_eq!(topo.relays["relay1"].parent, "b");
    }
}
