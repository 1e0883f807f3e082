//! Deployment ingestion sources.
//!
//! One capability, two variants: a live fetch against the inventory server
//! and a snapshot reload. Both hand the caller the same deployment type, so
//! everything downstream of ingestion is indifferent to where the data came
//! from.

pub mod rest;

use std::path::PathBuf;

use crate::errors::MapResult;
use crate::models::Record;
use crate::snapshot;
use crate::topology::pipeline::{build_deployment, BuildOptions, BuildOutcome};

/// The excluded network collaborator's interface: something that can hand
/// back the two filtered record sets, relays-and-root first.
pub trait RecordSource {
    fn fetch_relays(&mut self) -> MapResult<Vec<Record>>;
    fn fetch_endpoints(&mut self) -> MapResult<Vec<Record>>;
}

/// Anything that can produce a fully resolved deployment.
pub trait DeploymentSource {
    fn load(&mut self) -> MapResult<BuildOutcome>;
}

/// Live ingestion: fetch both record sets, then run the build pipeline.
pub struct LiveSource<S> {
    records: S,
    options: BuildOptions,
}

impl<S: RecordSource> LiveSource<S> {
    pub fn new(records: S, options: BuildOptions) -> Self {
        Self { records, options }
    }
}

impl<S: RecordSource> DeploymentSource for LiveSource<S> {
    fn load(&mut self) -> MapResult<BuildOutcome> {
        let relay_records = self.records.fetch_relays()?;
        let endpoint_records = self.records.fetch_endpoints()?;
        build_deployment(&relay_records, &endpoint_records, &self.options)
    }
}

/// Snapshot reload: bypasses build, resolve, and aggregate entirely.
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DeploymentSource for SnapshotSource {
    fn load(&mut self) -> MapResult<BuildOutcome> {
        let deployment = snapshot::load_file(&self.path)?;
        Ok(BuildOutcome {
            deployment,
            unresolved: Vec::new(),
        })
    }
}
