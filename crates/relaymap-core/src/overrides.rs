//! Operator-supplied relay name overrides.
//!
//! Consulted only when automatic resolution fails: upstream references that
//! name decommissioned relays, NAT'd addresses, or plain typos can be mapped
//! onto a canonical relay name.

use indexmap::IndexMap;

use crate::errors::{MapError, MapResult};

/// Mapping from a raw upstream-reference string to a canonical relay name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideMap {
    entries: IndexMap<String, String>,
}

impl OverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the CLI form `from:to[,from:to...]`.
    ///
    /// An entry without exactly one `:` separator is a fatal syntax error,
    /// and so is a duplicate `from` key: the map is a correction table, and
    /// two corrections for the same reference are a configuration mistake,
    /// not something to resolve by position.
    pub fn parse(spec: &str) -> MapResult<Self> {
        let mut entries = IndexMap::new();
        for pair in spec.split(',') {
            let mut parts = pair.split(':');
            let (from, to) = match (parts.next(), parts.next(), parts.next()) {
                (Some(from), Some(to), None) if !from.is_empty() && !to.is_empty() => (from, to),
                _ => {
                    return Err(MapError::Overrides(format!(
                        "malformed override entry {pair:?}, expected from:to"
                    )))
                }
            };
            if entries.insert(from.to_string(), to.to_string()).is_some() {
                return Err(MapError::Overrides(format!(
                    "duplicate override key {from:?}"
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, from: &str) -> Option<&str> {
        self.entries.get(from).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_and_multiple_entries() {
        let map = OverrideMap::parse("old-relay:relay1").unwrap();
        assert_eq!(map.get("old-relay"), Some("relay1"));
        assert_eq!(map.get("relay1"), None);

        let map = OverrideMap::parse("a:b,c:d").unwrap();
        assert_eq!(map.get("a"), Some("b"));
        assert_eq!(map.get("c"), Some("d"));
    }

    #[test]
    fn test_parse_rejects_malformed_entries() {
        assert!(OverrideMap::parse("no-separator").is_err());
        assert!(OverrideMap::parse("too:many:colons").is_err());
        assert!(OverrideMap::parse(":empty-from").is_err());
        assert!(OverrideMap::parse("empty-to:").is_err());
        assert!(OverrideMap::parse("a:b,,c:d").is_err());
    }

    #[test]
    fn test_parse_rejects_duplicate_from_keys() {
        assert!(OverrideMap::parse("a:b,a:c").is_err());
    }
}
