//! relaymap core library — relay topology resolution and mapping.
//!
//! Ingests a flat inventory of network endpoints from a fleet-management
//! server, reconstructs the implied relay hierarchy (root, relays, leaf
//! endpoints), groups leaves per relay by an arbitrary inventory property,
//! and emits the result as a Graphviz DOT graph. Resolved deployments can be
//! snapshotted to JSON and reloaded without touching the network.

pub mod errors;
pub mod graph;
pub mod models;
pub mod overrides;
pub mod snapshot;
pub mod source;
pub mod topology;

pub use errors::{MapError, MapResult};
pub use models::{Deployment, GroupBucket, Record, RelayNode, RelayTable, RunConfig};
pub use overrides::OverrideMap;
pub use topology::builder::DuplicatePolicy;
pub use topology::pipeline::{build_deployment, BuildOptions, BuildOutcome};
