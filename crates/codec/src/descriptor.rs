//! Field policy: the static annotations on a record field and the
//! descriptors resolved from them.

use convert_case::{Boundary, Case, Converter};
use policy::Capabilities;

/// Field annotations exactly as declared on a record.
///
/// `#[derive(Record)]` emits one of these per field, in declaration order.
/// Hand-written [`Record`](crate::Record) impls build them with the `const`
/// builders below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Declared identifier, without any `r#` prefix.
    pub ident: &'static str,
    /// Explicit wire name override.
    pub rename: Option<&'static str>,
    /// Never serialized. Merge still copies it.
    pub suppressed: bool,
    pub omit_empty: bool,
    pub read_right: Option<&'static str>,
    pub write_right: Option<&'static str>,
    /// The field's own fields are spliced into the parent's wire tree.
    pub embedded: bool,
}

impl FieldSpec {
    pub const fn new(ident: &'static str) -> Self {
        Self {
            ident,
            rename: None,
            suppressed: false,
            omit_empty: false,
            read_right: None,
            write_right: None,
            embedded: false,
        }
    }

    pub const fn rename(mut self, name: &'static str) -> Self {
        self.rename = Some(name);
        self
    }

    pub const fn suppressed(mut self) -> Self {
        self.suppressed = true;
        self
    }

    pub const fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    pub const fn read(mut self, right: &'static str) -> Self {
        self.read_right = Some(right);
        self
    }

    pub const fn write(mut self, right: &'static str) -> Self {
        self.write_right = Some(right);
        self
    }

    pub const fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }
}

/// The name a field is emitted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireName {
    Named(String),
    Suppressed,
}

/// Resolved policy for one field of one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub ident: &'static str,
    pub wire_name: WireName,
    pub omit_empty: bool,
    pub read_right: Option<&'static str>,
    pub write_right: Option<&'static str>,
    pub embedded: bool,
}

impl FieldDescriptor {
    /// Resolve a field's annotations.
    ///
    /// Suppression wins over any rename. An explicit rename is used verbatim;
    /// otherwise the identifier goes through [`wire_case`].
    pub fn resolve(spec: &FieldSpec) -> Self {
        let wire_name = if spec.suppressed {
            WireName::Suppressed
        } else {
            WireName::Named(match spec.rename {
                Some(name) => name.to_string(),
                None => wire_case(spec.ident),
            })
        };

        Self {
            ident: spec.ident,
            wire_name,
            omit_empty: spec.omit_empty,
            read_right: spec.read_right,
            write_right: spec.write_right,
            embedded: spec.embedded,
        }
    }

    /// `None` for suppressed fields.
    pub fn wire_name(&self) -> Option<&str> {
        match &self.wire_name {
            WireName::Named(name) => Some(name),
            WireName::Suppressed => None,
        }
    }

    pub fn may_read(&self, capabilities: &Capabilities) -> bool {
        self.read_right.is_none_or(|right| capabilities.has_right(right))
    }

    pub fn may_write(&self, capabilities: &Capabilities) -> bool {
        self.write_right.is_none_or(|right| capabilities.has_right(right))
    }
}

/// Wire case convention: lower_snake_case.
///
/// Words split on `_`, on a lowercase-to-uppercase step and before the last
/// capital of an acronym (`UserID` → `user_id`, `HTTPStatus` →
/// `http_status`). Digits never start a word, so `line1` stays `line1` and
/// snake_case identifiers map to themselves.
pub fn wire_case(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    if !ident.chars().any(char::is_uppercase) {
        return ident.to_string();
    }
    Converter::new()
        .set_boundaries(&[Boundary::Underscore, Boundary::LowerUpper, Boundary::Acronym])
        .to_case(Case::Snake)
        .convert(ident)
}
