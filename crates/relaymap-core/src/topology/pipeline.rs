//! Deployment construction pipeline: build, resolve, aggregate, finalize.
//!
//! Resolution fans out over leaves with Rayon — it only reads the immutable
//! topology — while aggregation applies the results sequentially, so all
//! mutation of a relay node happens on one thread. A final ordering pass
//! makes the result independent of leaf-processing order.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::errors::MapResult;
use crate::models::{Deployment, Record, RunConfig};
use crate::overrides::OverrideMap;
use crate::topology::aggregate::assign_endpoint;
use crate::topology::builder::{build_topology, DuplicatePolicy, Topology};
use crate::topology::resolver::{resolve_endpoint, Resolution};

/// A leaf that no heuristic could place, kept for diagnostic reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Unresolved {
    pub endpoint_name: String,
    /// Normalized candidate derived from the leaf's upstream reference.
    pub candidate: String,
}

/// Result of a full live build: the deployment plus the stragglers.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub deployment: Deployment,
    pub unresolved: Vec<Unresolved>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub overrides: OverrideMap,
    pub duplicate_policy: DuplicatePolicy,
    pub config: RunConfig,
}

/// Build a deployment from pre-filtered record sets.
///
/// `relay_records` must hold every record with the relay or root flag set;
/// `endpoint_records` holds the rest. Unresolvable endpoints are warned
/// about and skipped; they never abort the run.
pub fn build_deployment(
    relay_records: &[Record],
    endpoint_records: &[Record],
    options: &BuildOptions,
) -> MapResult<BuildOutcome> {
    let mut topology = build_topology(relay_records, &options.overrides, options.duplicate_policy)?;

    let resolutions: Vec<Resolution> = endpoint_records
        .par_iter()
        .map(|leaf| resolve_endpoint(leaf, &topology, &options.overrides))
        .collect();

    let mut unresolved = Vec::new();
    for (leaf, resolution) in endpoint_records.iter().zip(resolutions) {
        match resolution {
            Resolution::Resolved(relay_name) => {
                // The resolver only returns names present in the table.
                if let Some(node) = topology.relays.get_mut(&relay_name) {
                    assign_endpoint(node, leaf);
                }
            }
            Resolution::Unresolved(candidate) => {
                warn!(
                    endpoint = %leaf.name,
                    candidate = %candidate,
                    "could not locate relay by name or IP address, skipping endpoint"
                );
                unresolved.push(Unresolved {
                    endpoint_name: leaf.name.clone(),
                    candidate,
                });
            }
        }
    }

    finalize(&mut topology);
    info!(
        relays = topology.relays.len(),
        endpoints = endpoint_records.len(),
        unresolved = unresolved.len(),
        "deployment build complete"
    );

    Ok(BuildOutcome {
        deployment: Deployment {
            relays: topology.relays,
            config: options.config.clone(),
        },
        unresolved,
    })
}

/// Impose a deterministic order on every collection in the tree.
///
/// Relays sort by name, buckets by group value, members by (name, id).
/// After this pass the aggregates are a pure function of the input sets,
/// whatever order the leaves were processed in.
fn finalize(topology: &mut Topology) {
    topology.relays.sort_keys();
    for node in topology.relays.values_mut() {
        node.groups.sort_keys();
        for bucket in node.groups.values_mut() {
            bucket
                .members
                .sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        }
    }
}
