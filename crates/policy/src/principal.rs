//! Authenticated identities.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An authenticated identity and the rights granted to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    pub user_id: u64,
    /// Granted right names in grant order. Duplicates are kept.
    #[serde(default)]
    pub rights: Vec<String>,
}

impl Principal {
    pub fn new(
        username: impl Into<String>,
        user_id: u64,
        rights: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            username: username.into(),
            user_id,
            rights: rights.into_iter().map(Into::into).collect(),
        }
    }

    /// Read the principal out of a verified token's claims.
    ///
    /// The principal lives under the `sub` claim. A missing or `null` subject
    /// is an anonymous session; anything else must carry `username`,
    /// `user_id` and a list of string `rights`.
    pub fn from_claims(claims: &Value) -> Result<Option<Self>> {
        match claims.get("sub") {
            None | Some(Value::Null) => Ok(None),
            Some(subject) => Self::deserialize(subject)
                .map(Some)
                .map_err(|e| Error::InvalidClaims(e.to_string())),
        }
    }

    pub fn has_right(&self, right: &str) -> bool {
        self.rights.iter().any(|r| r == right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn claims_with_subject() {
        let claims = json!({
            "iss": "scope",
            "sub": { "username": "ada", "user_id": 7, "rights": ["admin", "seeErrors"] },
        });
        let principal = Principal::from_claims(&claims).unwrap().unwrap();
        assert_eq!(principal, Principal::new("ada", 7, ["admin", "seeErrors"]));
    }

    #[test]
    fn claims_without_subject_are_anonymous() {
        assert!(Principal::from_claims(&json!({ "iss": "scope" })).unwrap().is_none());
        assert!(Principal::from_claims(&json!({ "sub": null })).unwrap().is_none());
    }

    #[test]
    fn malformed_subject_is_rejected() {
        let claims = json!({ "sub": { "username": "ada", "user_id": "seven", "rights": [] } });
        assert!(matches!(
            Principal::from_claims(&claims),
            Err(Error::InvalidClaims(_))
        ));

        let claims = json!({ "sub": { "username": "ada", "user_id": 7, "rights": [1, 2] } });
        assert!(Principal::from_claims(&claims).is_err());
    }

    #[test]
    fn rights_match_exactly() {
        let principal = Principal::new("ada", 1, ["admin"]);
        assert!(principal.has_right("admin"));
        assert!(!principal.has_right("adm"));
        assert!(!principal.has_right("Admin"));
    }
}
