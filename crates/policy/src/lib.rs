//! Principals and capability sets.
//!
//! Core principle: **a right is only ever held by an authenticated principal.**
//! An anonymous caller is the absence of a principal, not a principal with no
//! rights, and every check against it denies.

mod capability;
mod error;
mod principal;
mod resolver;

pub use capability::Capabilities;
pub use error::{Error, Result};
pub use principal::Principal;
pub use resolver::{PrincipalResolver, StaticResolver};
