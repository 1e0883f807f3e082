//! Snapshot codec: persist and reload a resolved deployment.
//!
//! A snapshot is a total substitute for live ingestion — the graph emitter
//! cannot tell a decoded deployment from a freshly built one. The document
//! has two top-level fields, `relay` (the full relay table) and `cnf` (the
//! run configuration), matching what earlier tooling in this space wrote.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{MapError, MapResult};
use crate::models::{Deployment, RelayTable, RunConfig};

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDoc {
    relay: RelayTable,
    cnf: RunConfig,
}

/// Encode a deployment as a pretty-printed JSON document.
pub fn encode(deployment: &Deployment) -> MapResult<String> {
    let doc = SnapshotDoc {
        relay: deployment.relays.clone(),
        cnf: deployment.config.clone(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Decode a snapshot document. Malformed input is fatal.
pub fn decode(text: &str) -> MapResult<Deployment> {
    let doc: SnapshotDoc = serde_json::from_str(text)
        .map_err(|e| MapError::Snapshot(format!("malformed snapshot document: {e}")))?;
    Ok(Deployment {
        relays: doc.relay,
        config: doc.cnf,
    })
}

pub fn write_file(path: &Path, deployment: &Deployment) -> MapResult<()> {
    fs::write(path, encode(deployment)?)?;
    Ok(())
}

pub fn load_file(path: &Path) -> MapResult<Deployment> {
    let text = fs::read_to_string(path)
        .map_err(|e| MapError::Snapshot(format!("cannot read {}: {e}", path.display())))?;
    decode(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{endpoint, relay, root};
    use crate::topology::pipeline::{build_deployment, BuildOptions};

    fn sample_deployment() -> Deployment {
        let relays = vec![
            root("bigfix-root", &["192.168.1.1"]),
            relay("relay1", "bigfix-root:52311", &["10.0.0.5"]),
        ];
        let leaves = vec![
            endpoint(10, "ep1", "relay1:52311", &["10.0.0.0/24"]),
            endpoint(11, "ep2", "relay1:52311", &["10.0.0.0/24", "10.0.1.0/24"]),
        ];
        let options = BuildOptions {
            config: RunConfig {
                server: "bigfix-root.example.com".to_string(),
                ..RunConfig::default()
            },
            ..BuildOptions::default()
        };
        build_deployment(&relays, &leaves, &options)
            .unwrap()
            .deployment
    }

    #[test]
    fn test_round_trip_is_exact() {
        let deployment = sample_deployment();
        let decoded = decode(&encode(&deployment).unwrap()).unwrap();
        assert_eq!(decoded, deployment);
    }

    #[test]
    fn test_document_shape() {
        let doc: serde_json::Value =
            serde_json::from_str(&encode(&sample_deployment()).unwrap()).unwrap();
        assert!(doc.get("relay").is_some());
        assert!(doc.get("cnf").is_some());
        assert_eq!(doc["cnf"]["server"], "bigfix-root.example.com");
        assert_eq!(doc["relay"]["relay1"]["unique_endpoints"], 3);
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        assert!(matches!(decode("not json"), Err(MapError::Snapshot(_))));
        assert!(matches!(decode("{}"), Err(MapError::Snapshot(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let deployment = sample_deployment();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment.json");
        write_file(&path, &deployment).unwrap();
        assert_eq!(load_file(&path).unwrap(), deployment);
    }
}
