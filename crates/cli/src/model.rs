//! The account record the CLI reads and writes.

use chrono::{DateTime, Utc};
use codec::Record;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account as stored.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Record)]
#[serde(default)]
pub struct Account {
    #[serde(flatten)]
    pub meta: Meta,
    pub username: String,
    pub display_name: String,
    #[scope(omit_empty)]
    pub email: String,
    #[scope(read = "billing", write = "billing")]
    pub plan: String,
    #[scope(read = "admin", write = "admin")]
    pub rights: Vec<String>,
    pub address: Address,
    #[serde(skip_serializing)]
    #[scope(write = "admin")]
    pub password_hash: String,
}

/// Bookkeeping fields shown inline with the account.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Record)]
#[serde(default)]
pub struct Meta {
    #[scope(write = "admin")]
    pub id: Uuid,
    #[scope(omit_empty, write = "admin")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Record)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub city: String,
    #[scope(write = "verify")]
    pub verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::{Capabilities, Principal};
    use serde_json::json;

    fn stored() -> Account {
        Account {
            meta: Meta {
                id: Uuid::nil(),
                created_at: None,
            },
            username: "ada".into(),
            display_name: "Ada".into(),
            email: String::new(),
            plan: "pro".into(),
            rights: vec!["billing".into()],
            address: Address {
                street: "1 Loop Rd".into(),
                city: "Cambridge".into(),
                verified: true,
            },
            password_hash: "$argon2id$...".into(),
        }
    }

    #[test]
    fn public_view() {
        let view = codec::serialize(&stored(), &Capabilities::anonymous()).unwrap();
        assert_eq!(
            view,
            json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "username": "ada",
                "display_name": "Ada",
                "address": { "street": "1 Loop Rd", "city": "Cambridge", "verified": true },
            })
        );
    }

    #[test]
    fn billing_view_and_update() {
        let billing = Capabilities::authenticated(Principal::new("ops", 9, ["billing"]));
        let view = codec::to_tree(&stored(), &billing).unwrap();
        assert_eq!(view["plan"], json!("pro"));
        assert!(!view.contains_key("rights"));
        assert!(!view.contains_key("password_hash"));

        let mut account = stored();
        let body = json!({
            "id": "11111111-1111-1111-1111-111111111111",
            "username": "ada",
            "display_name": "Ada L.",
            "plan": "free",
            "rights": ["admin"],
            "address": { "street": "1 Loop Rd", "city": "Cambridge", "verified": false },
            "password_hash": "$argon2id$stolen",
        });
        codec::read_value_into(&mut account, body, &billing).unwrap();

        assert_eq!(account.plan, "free");
        assert_eq!(account.display_name, "Ada L.");
        assert_eq!(account.meta.id, Uuid::nil());
        assert_eq!(account.rights, ["billing"]);
        assert!(account.address.verified);
        assert_eq!(account.password_hash, "$argon2id$...");
    }
}
