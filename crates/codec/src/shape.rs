//! Value shapes: the closed set of categories the serializer walks.

use crate::FieldDescriptor;
use crate::descriptor::FieldSpec;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// How a value presents itself to the codec.
pub enum Shape<'a> {
    /// Passed through unchanged.
    Scalar(Value),
    /// Encodes itself as one atomic wire value.
    Leaf(&'a dyn Encode),
    Sequence(Vec<&'a dyn Scoped>),
    /// String-keyed entries, in output order.
    Mapping(Vec<(&'a str, &'a dyn Scoped)>),
    /// `None` is absent.
    Optional(Option<&'a dyn Scoped>),
    Record(&'a dyn Record),
}

/// A value the codec can walk.
pub trait Scoped {
    fn shape(&self) -> Shape<'_>;
}

/// A leaf's own encoding.
pub trait Encode {
    fn encode(&self) -> serde_json::Result<Value>;
}

impl<T: Serialize + ?Sized> Encode for T {
    fn encode(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// A struct whose fields carry read and write policy.
///
/// Usually derived with `#[derive(Record)]`.
pub trait Record: Scoped + 'static {
    /// Field annotations in declaration order.
    fn field_specs() -> &'static [FieldSpec]
    where
        Self: Sized;

    /// Resolved descriptors, parallel to [`Record::fields`].
    fn descriptors(&self) -> &'static [FieldDescriptor];

    /// Field values in declaration order.
    fn fields(&self) -> Vec<&dyn Scoped>;
}

/// Implement [`Scoped`] and [`Merge`](crate::Merge) for types that encode
/// themselves.
///
/// A leaf is serialized through its own `serde::Serialize` impl and merged
/// wholesale, never field by field. Use it for value types that keep their
/// own invariants: timestamps, identifiers, enums.
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// #[serde(rename_all = "snake_case")]
/// enum Status { Active, Suspended }
///
/// codec::scoped_leaf!(Status);
///
/// let tree = codec::serialize(&Status::Suspended, &codec::Capabilities::anonymous()).unwrap();
/// assert_eq!(tree, "suspended");
/// ```
#[macro_export]
macro_rules! scoped_leaf {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Scoped for $ty {
                fn shape(&self) -> $crate::Shape<'_> {
                    $crate::Shape::Leaf(self)
                }
            }

            impl $crate::Merge for $ty {
                fn merge(
                    &mut self,
                    scratch: Self,
                    _capabilities: &$crate::Capabilities,
                ) -> $crate::Result<()> {
                    *self = scratch;
                    Ok(())
                }
            }
        )+
    };
}

macro_rules! scalar {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Scoped for $ty {
                fn shape(&self) -> Shape<'_> {
                    Shape::Scalar(Value::from(self.clone()))
                }
            }
        )+
    };
}

scalar!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String);

impl Scoped for char {
    fn shape(&self) -> Shape<'_> {
        Shape::Scalar(Value::String(self.to_string()))
    }
}

impl Scoped for () {
    fn shape(&self) -> Shape<'_> {
        Shape::Scalar(Value::Null)
    }
}

impl Scoped for Value {
    fn shape(&self) -> Shape<'_> {
        Shape::Scalar(self.clone())
    }
}

scoped_leaf!(
    chrono::DateTime<chrono::Utc>,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    uuid::Uuid,
);

impl<T: Scoped> Scoped for Option<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Optional(self.as_ref().map(|v| v as &dyn Scoped))
    }
}

impl<T: Scoped + ?Sized> Scoped for Box<T> {
    fn shape(&self) -> Shape<'_> {
        (**self).shape()
    }
}

impl<T: Scoped> Scoped for Vec<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Sequence(self.iter().map(|v| v as &dyn Scoped).collect())
    }
}

impl<T: Scoped> Scoped for VecDeque<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Sequence(self.iter().map(|v| v as &dyn Scoped).collect())
    }
}

impl<T: Scoped, const N: usize> Scoped for [T; N] {
    fn shape(&self) -> Shape<'_> {
        Shape::Sequence(self.iter().map(|v| v as &dyn Scoped).collect())
    }
}

impl<T: Scoped> Scoped for BTreeMap<String, T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Mapping(
            self.iter()
                .map(|(k, v)| (k.as_str(), v as &dyn Scoped))
                .collect(),
        )
    }
}

/// Entries are emitted in key order so output does not depend on hashing.
impl<T: Scoped, S> Scoped for HashMap<String, T, S> {
    fn shape(&self) -> Shape<'_> {
        let mut entries: Vec<_> = self
            .iter()
            .map(|(k, v)| (k.as_str(), v as &dyn Scoped))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        Shape::Mapping(entries)
    }
}
