//! Per-relay endpoint aggregation.

use crate::models::{Record, RelayNode};

/// Fold one resolved leaf into its owning relay.
///
/// Bumps the unique-endpoint count once, then credits every group value the
/// leaf carries. Multi-homed leaves therefore land in several buckets but
/// still count as one endpoint.
pub fn assign_endpoint(node: &mut RelayNode, leaf: &Record) {
    node.unique_endpoints += 1;
    for value in &leaf.group_values {
        let bucket = node.groups.entry(value.clone()).or_default();
        bucket.count += 1;
        bucket.members.push(leaf.clone());
    }
}
