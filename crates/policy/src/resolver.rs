//! Principal resolution from session tokens.

use crate::{Error, Principal, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Turns a session token into the principal it was issued to.
///
/// Called once per inbound request before any codec operation. Token
/// signing and verification belong to the implementor.
pub trait PrincipalResolver {
    /// `Ok(None)` is an anonymous request; `Err` is a token that must not be
    /// served at all.
    fn resolve(&self, token: &str) -> Result<Option<Principal>>;
}

/// A principal table loaded from TOML, for development and tests.
///
/// ```toml
/// [[principal]]
/// token = "dev-admin"
/// username = "root"
/// user_id = 1
/// rights = ["admin", "seeErrors"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticResolver {
    #[serde(default, rename = "principal")]
    entries: Vec<Entry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    token: String,
    username: String,
    user_id: u64,
    #[serde(default)]
    rights: Vec<String>,
}

impl Entry {
    fn principal(&self) -> Principal {
        Principal::new(&self.username, self.user_id, &self.rights)
    }
}

impl StaticResolver {
    /// Load a principal table from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse a principal table from a TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        let resolver: Self = toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))?;
        resolver.validate()?;
        Ok(resolver)
    }

    /// Add or replace the principal for `token`.
    pub fn insert(&mut self, token: impl Into<String>, principal: Principal) {
        let token = token.into();
        self.entries.retain(|e| e.token != token);
        self.entries.push(Entry {
            token,
            username: principal.username,
            user_id: principal.user_id,
            rights: principal.rights,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject tables that map one token to two principals.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(entry.token.as_str()) {
                return Err(Error::Parse(format!("duplicate token for {}", entry.username)));
            }
        }
        Ok(())
    }
}

impl PrincipalResolver for StaticResolver {
    fn resolve(&self, token: &str) -> Result<Option<Principal>> {
        let found = self
            .entries
            .iter()
            .find(|e| !token.is_empty() && e.token == token)
            .map(Entry::principal);
        debug!(authenticated = found.is_some(), "resolved session token");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
[[principal]]
token = "dev-admin"
username = "root"
user_id = 1
rights = ["admin", "seeErrors"]

[[principal]]
token = "dev-guest"
username = "guest"
user_id = 2
"#;

    #[test]
    fn test_parse_toml() {
        let resolver = StaticResolver::parse(TABLE).unwrap();
        assert_eq!(resolver.len(), 2);

        let root = resolver.resolve("dev-admin").unwrap().unwrap();
        assert_eq!(root.username, "root");
        assert!(root.has_right("seeErrors"));

        let guest = resolver.resolve("dev-guest").unwrap().unwrap();
        assert!(guest.rights.is_empty());
    }

    #[test]
    fn test_unknown_token_is_anonymous() {
        let resolver = StaticResolver::parse(TABLE).unwrap();
        assert!(resolver.resolve("nope").unwrap().is_none());
        assert!(resolver.resolve("").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_tokens_rejected() {
        let toml = r#"
[[principal]]
token = "t"
username = "a"
user_id = 1

[[principal]]
token = "t"
username = "b"
user_id = 2
"#;
        assert!(matches!(StaticResolver::parse(toml), Err(Error::Parse(_))));
    }

    #[test]
    fn test_insert_replaces() {
        let mut resolver = StaticResolver::default();
        assert!(resolver.is_empty());
        resolver.insert("t", Principal::new("a", 1, ["x"]));
        resolver.insert("t", Principal::new("b", 2, ["y"]));
        assert_eq!(resolver.len(), 1);
        assert_eq!(resolver.resolve("t").unwrap().unwrap().username, "b");
    }
}
