//! The capability set a request runs under.

use crate::{Error, Principal, Result};
use tracing::trace;

/// The rights available to one request.
///
/// Wraps an optional [`Principal`]. `None` means the request is anonymous;
/// every right check then fails, and mutations of the rights list are
/// refused or ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    principal: Option<Principal>,
}

impl Capabilities {
    /// An unauthenticated capability set.
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Returns true if the principal holds `right`. Always false when anonymous.
    pub fn has_right(&self, right: &str) -> bool {
        self.principal.as_ref().is_some_and(|p| p.has_right(right))
    }

    /// Fail with [`Error::Unauthorized`] unless the principal holds `right`.
    pub fn require_right(&self, right: &str) -> Result<()> {
        if self.has_right(right) {
            Ok(())
        } else {
            Err(Error::Unauthorized(right.to_string()))
        }
    }

    /// Grant `right` to the current principal.
    ///
    /// Grants are appended as given; granting a held right adds a second entry.
    pub fn add_right(&mut self, right: impl Into<String>) -> Result<()> {
        let principal = self.principal.as_mut().ok_or(Error::NotAuthenticated)?;
        principal.rights.push(right.into());
        Ok(())
    }

    /// Revoke every entry equal to `right`. No effect when anonymous.
    pub fn remove_right(&mut self, right: &str) {
        if let Some(principal) = self.principal.as_mut() {
            let before = principal.rights.len();
            principal.rights.retain(|r| r != right);
            trace!(right, removed = before - principal.rights.len(), "removed right");
        }
    }

    /// Empty string when anonymous.
    pub fn username(&self) -> &str {
        self.principal.as_ref().map_or("", |p| p.username.as_str())
    }

    /// Zero when anonymous.
    pub fn user_id(&self) -> u64 {
        self.principal.as_ref().map_or(0, |p| p.user_id)
    }

    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    pub fn clear_principal(&mut self) {
        self.principal = None;
    }
}

impl From<Option<Principal>> for Capabilities {
    fn from(principal: Option<Principal>) -> Self {
        Self { principal }
    }
}

impl From<Principal> for Capabilities {
    fn from(principal: Principal) -> Self {
        Self::authenticated(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Capabilities {
        Capabilities::authenticated(Principal::new("root", 1, ["admin"]))
    }

    #[test]
    fn anonymous_holds_nothing() {
        let caps = Capabilities::anonymous();
        assert!(!caps.is_authenticated());
        assert!(!caps.has_right("admin"));
        assert!(!caps.has_right(""));
        assert_eq!(caps.username(), "");
        assert_eq!(caps.user_id(), 0);
    }

    #[test]
    fn authenticated_without_rights_is_not_anonymous() {
        let caps = Capabilities::authenticated(Principal::new("guest", 2, Vec::<String>::new()));
        assert!(caps.is_authenticated());
        assert!(!caps.has_right("admin"));
    }

    #[test]
    fn add_right_requires_authentication() {
        let mut caps = Capabilities::anonymous();
        assert!(matches!(caps.add_right("admin"), Err(Error::NotAuthenticated)));
        assert!(!caps.has_right("admin"));
    }

    #[test]
    fn add_right_keeps_duplicates() {
        let mut caps = admin();
        caps.add_right("admin").unwrap();
        caps.add_right("billing").unwrap();
        let rights = &caps.principal().unwrap().rights;
        assert_eq!(rights, &["admin", "admin", "billing"]);
        assert!(caps.has_right("billing"));
    }

    #[test]
    fn remove_right_is_exact_and_total() {
        let mut caps = admin();
        caps.add_right("admin").unwrap();
        caps.add_right("administer").unwrap();

        caps.remove_right("admin");
        assert!(!caps.has_right("admin"));
        assert!(caps.has_right("administer"));

        caps.remove_right("missing");
        assert_eq!(caps.principal().unwrap().rights, ["administer"]);
    }

    #[test]
    fn remove_right_when_anonymous_is_a_no_op() {
        let mut caps = Capabilities::anonymous();
        caps.remove_right("admin");
        assert_eq!(caps, Capabilities::anonymous());
    }

    #[test]
    fn require_right() {
        assert!(admin().require_right("admin").is_ok());
        assert!(matches!(
            admin().require_right("billing"),
            Err(Error::Unauthorized(right)) if right == "billing"
        ));
        assert!(Capabilities::anonymous().require_right("admin").is_err());
    }

    #[test]
    fn clear_principal_drops_rights() {
        let mut caps = admin();
        caps.clear_principal();
        assert!(!caps.has_right("admin"));
        caps.set_principal(Principal::new("ada", 3, ["billing"]));
        assert_eq!(caps.username(), "ada");
        assert_eq!(caps.user_id(), 3);
    }
}
