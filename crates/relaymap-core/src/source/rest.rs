//! REST record source for BigFix-style inventory servers.
//!
//! Thin wrapper over the server's session relevance endpoint: authenticate
//! once against `/api/login`, then POST form-encoded relevance queries to
//! `/api/query` with JSON output. Fetch or authentication failures are fatal
//! and surface before any topology work begins.

use serde_json::Value;
use tracing::debug;

use crate::errors::{MapError, MapResult};
use crate::models::Record;
use crate::source::RecordSource;

#[derive(Debug, Clone)]
pub struct RestConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Accept self-signed certificates. Root servers commonly self-sign.
    pub insecure: bool,
    pub group_property: String,
}

/// Session relevance text for one of the two filtered record sets.
///
/// The projection matches the positional wire-row shape `Record::from_row`
/// expects; `relays` selects the relay/root set, otherwise the leaves.
fn relevance_query(group_property: &str, relays: bool) -> String {
    let filter = if relays {
        "relay server flag of it or root server flag of it"
    } else {
        "not relay server flag of it and not root server flag of it"
    };
    format!(
        "(id of it, name of it as lowercase, \
         last report time of it, relay server flag of it, \
         root server flag of it, relay server of it as lowercase, \
         concatenation \"|\" of (ip addresses of it as string), \
         concatenation \"|\" of \
         values of property results whose (name of property of it = \"{group_property}\") of it\
         ) of bes computers whose ({filter})"
    )
}

/// Parse the `result` rows of a query response into records.
fn records_from_response(response: &Value) -> MapResult<Vec<Record>> {
    let rows = response
        .get("result")
        .and_then(Value::as_array)
        .ok_or_else(|| MapError::Source("query response has no result array".to_string()))?;
    rows.iter().map(Record::from_row).collect()
}

/// One authenticated connection to one inventory root server.
pub struct RestSource {
    config: RestConfig,
    client: reqwest::blocking::Client,
    base_url: String,
}

impl RestSource {
    /// Build the client and validate credentials against `/api/login`.
    pub fn connect(config: RestConfig) -> MapResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .build()?;
        let base_url = format!("https://{}:{}", config.server, config.port);

        let response = client
            .get(format!("{base_url}/api/login"))
            .basic_auth(&config.user, Some(&config.password))
            .send()?;
        if !response.status().is_success() {
            return Err(MapError::Source(format!(
                "login to {base_url} failed with status {}",
                response.status()
            )));
        }

        Ok(Self {
            config,
            client,
            base_url,
        })
    }

    fn query(&self, relevance: &str) -> MapResult<Vec<Record>> {
        debug!(server = %self.config.server, "running session relevance query");
        let response = self
            .client
            .post(format!("{}/api/query", self.base_url))
            .basic_auth(&self.config.user, Some(&self.config.password))
            .form(&[("relevance", relevance), ("output", "json")])
            .send()?;
        if !response.status().is_success() {
            return Err(MapError::Source(format!(
                "query failed with status {}",
                response.status()
            )));
        }
        records_from_response(&response.json::<Value>()?)
    }
}

impl RecordSource for RestSource {
    fn fetch_relays(&mut self) -> MapResult<Vec<Record>> {
        self.query(&relevance_query(&self.config.group_property, true))
    }

    fn fetch_endpoints(&mut self) -> MapResult<Vec<Record>> {
        self.query(&relevance_query(&self.config.group_property, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relevance_query_embeds_property_and_filter() {
        let relays = relevance_query("Subnet Address", true);
        assert!(relays.contains("name of property of it = \"Subnet Address\""));
        assert!(relays.contains("whose (relay server flag of it or root server flag of it)"));

        let leaves = relevance_query("Subnet Address", false);
        assert!(
            leaves.contains("whose (not relay server flag of it and not root server flag of it)")
        );
    }

    #[test]
    fn test_records_from_response() {
        let response = json!({
            "result": [
                [1, "bigfix-root", "t", false, true, "bigfix-root", "192.168.1.1", ""],
                [2, "relay1", "t", true, false, "bigfix-root:52311", "10.0.0.5", ""]
            ]
        });
        let records = records_from_response(&response).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "bigfix-root");
        assert!(records[1].is_relay);
    }

    #[test]
    fn test_missing_result_array_is_a_source_error() {
        let response = json!({"error": "bad relevance"});
        assert!(matches!(
            records_from_response(&response),
            Err(MapError::Source(_))
        ));
    }
}
