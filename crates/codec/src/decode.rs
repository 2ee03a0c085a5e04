//! Two-phase decode: parse untrusted input into a scratch value, then merge.

use crate::{Error, Merge, Result};
use policy::Capabilities;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Decode `body` with no rights applied.
///
/// Only for values that never reach a live record without going through
/// [`read_into`] or [`crate::merge`].
pub fn read_unsafe<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(Error::Malformed)
}

/// Decode `body` and copy the fields `capabilities` may write into `target`.
///
/// The whole body is decoded into a fresh scratch value first. A decode
/// failure returns before `target` is touched. Records should carry
/// `#[serde(default)]` so fields missing from the body decode as zero values.
pub fn read_into<T>(target: &mut T, body: &[u8], capabilities: &Capabilities) -> Result<()>
where
    T: Merge + DeserializeOwned,
{
    let scratch = read_unsafe::<T>(body)?;
    apply(scratch, target, capabilities)
}

/// Like [`read_into`] for a body that is already parsed.
pub fn read_value_into<T>(target: &mut T, body: Value, capabilities: &Capabilities) -> Result<()>
where
    T: Merge + DeserializeOwned,
{
    let scratch = serde_json::from_value::<T>(body).map_err(Error::Malformed)?;
    apply(scratch, target, capabilities)
}

fn apply<T: Merge>(scratch: T, target: &mut T, capabilities: &Capabilities) -> Result<()> {
    debug!(
        record = std::any::type_name::<T>(),
        user_id = capabilities.user_id(),
        "merging decoded body"
    );
    target.merge(scratch, capabilities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;
    use policy::Principal;
    use serde::Deserialize;

    fn percent(value: u8) -> std::result::Result<Percent, String> {
        if value <= 100 {
            Ok(Percent(value))
        } else {
            Err(format!("percent out of range: {value}"))
        }
    }

    #[derive(Debug, Default, Clone, Copy, PartialEq, serde::Serialize, Deserialize)]
    #[serde(try_from = "u8")]
    struct Percent(u8);

    impl TryFrom<u8> for Percent {
        type Error = String;

        fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
            percent(value)
        }
    }

    crate::scoped_leaf!(Percent);

    #[derive(Debug, Default, PartialEq, Deserialize, Record)]
    #[serde(default)]
    struct Quota {
        used: Percent,
        #[scope(write = "admin")]
        limit: Percent,
    }

    #[test]
    fn leaf_decode_failure_aborts_before_merge() {
        let mut quota = Quota {
            used: Percent(10),
            limit: Percent(90),
        };
        let err = read_into(&mut quota, br#"{"used": 150}"#, &Capabilities::anonymous())
            .unwrap_err();
        assert!(err.to_string().contains("percent out of range: 150"));
        assert_eq!(quota.used, Percent(10));
    }

    #[test]
    fn leaves_merge_wholesale_under_policy() {
        let mut quota = Quota {
            used: Percent(10),
            limit: Percent(90),
        };
        let admin = Capabilities::authenticated(Principal::new("root", 1, ["admin"]));
        read_into(&mut quota, br#"{"used": 20, "limit": 95}"#, &Capabilities::anonymous()).unwrap();
        assert_eq!(quota, Quota { used: Percent(20), limit: Percent(90) });

        read_into(&mut quota, br#"{"used": 20, "limit": 95}"#, &admin).unwrap();
        assert_eq!(quota.limit, Percent(95));
    }

    #[test]
    fn read_unsafe_ignores_rights() {
        let quota: Quota = read_unsafe(br#"{"limit": 5}"#).unwrap();
        assert_eq!(quota.limit, Percent(5));
        assert!(matches!(read_unsafe::<Quota>(br#""text""#), Err(Error::Malformed(_))));
    }
}
