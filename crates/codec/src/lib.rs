//! Rights-scoped structural codec.
//!
//! Converts between JSON wire trees and typed records, filtering every field
//! through the caller's [`Capabilities`]. One record type can then serve many
//! views and many write-permission levels without per-endpoint DTOs.
//!
//! # Overview
//!
//! - **Outbound**: [`serialize`] walks a value and emits only the fields the
//!   caller may read. Fields can be renamed, suppressed, omitted when empty,
//!   or embedded (flattened into the parent).
//! - **Inbound**: [`read_into`] decodes the body into a throwaway scratch
//!   value with ordinary serde rules, then [`merge`]s into the live record
//!   only the fields the caller may write. Parsing and authorization never
//!   mix.
//!
//! Policy failures are never errors. An unreadable field is simply absent
//! and an unwritable field keeps its value, so responses do not reveal which
//! fields exist.
//!
//! # Example
//!
//! ```
//! use codec::{Capabilities, Record};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize, Record)]
//! #[serde(default)]
//! struct Account {
//!     name: String,
//!     #[scope(read = "admin", write = "admin")]
//!     secret: String,
//! }
//!
//! # fn example(caps: &Capabilities, body: &[u8]) -> codec::Result<()> {
//! let mut account = Account::default();
//! codec::read_into(&mut account, body, caps)?;
//! let tree = codec::to_tree(&account, caps)?;
//! assert_eq!(tree.contains_key("secret"), caps.has_right("admin"));
//! # Ok(())
//! # }
//! # example(&Capabilities::anonymous(), br#"{"name":"ada","secret":"x"}"#).unwrap();
//! ```

extern crate self as codec;

mod decode;
mod descriptor;
mod empty;
mod error;
mod merge;
pub mod registry;
mod serialize;
mod shape;

pub use codec_derive::Record;
pub use policy::{Capabilities, Principal};

pub use decode::{read_into, read_unsafe, read_value_into};
pub use descriptor::{FieldDescriptor, FieldSpec, WireName, wire_case};
pub use empty::is_empty;
pub use error::{DEFAULT_ERROR_TEXT, Error, ErrorMessage, Result, SEE_ERRORS_RIGHT};
pub use merge::{Merge, merge, merge_field};
pub use serialize::{serialize, to_tree, to_vec};
pub use shape::{Encode, Record, Scoped, Shape};
