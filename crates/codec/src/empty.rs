//! The omit-on-empty predicate.

use crate::{Scoped, Shape};
use serde_json::Value;

/// Returns true if `value` counts as absent for omit-on-empty fields.
///
/// Text, sequences and mappings are empty at length zero; booleans when
/// false; numbers when zero; optionals when `None`. Records and leaves are
/// never empty.
pub fn is_empty(value: &dyn Scoped) -> bool {
    match value.shape() {
        Shape::Scalar(scalar) => is_empty_scalar(&scalar),
        Shape::Sequence(items) => items.is_empty(),
        Shape::Mapping(entries) => entries.is_empty(),
        Shape::Optional(inner) => inner.is_none(),
        Shape::Leaf(_) | Shape::Record(_) => false,
    }
}

fn is_empty_scalar(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn text() {
        assert!(is_empty(&String::new()));
        assert!(!is_empty(&"x".to_string()));
    }

    #[test]
    fn numbers_and_booleans() {
        assert!(is_empty(&0u64));
        assert!(is_empty(&0i8));
        assert!(is_empty(&0.0f64));
        assert!(is_empty(&-0.0f32));
        assert!(is_empty(&false));
        assert!(!is_empty(&-1i32));
        assert!(!is_empty(&0.5f64));
        assert!(!is_empty(&true));
        assert!(!is_empty(&u64::MAX));
    }

    #[test]
    fn collections() {
        assert!(is_empty(&Vec::<String>::new()));
        assert!(!is_empty(&vec![String::new()]));
        assert!(is_empty(&BTreeMap::<String, u8>::new()));
        assert!(!is_empty(&BTreeMap::from([("k".to_string(), 0u8)])));
        assert!(is_empty(&[0u8; 0]));
    }

    #[test]
    fn optionals() {
        assert!(is_empty(&None::<String>));
        assert!(!is_empty(&Some(String::new())));
        assert!(!is_empty(&Some(0u8)));
    }

    #[test]
    fn leaves_are_never_empty() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert!(!is_empty(&epoch));
        assert!(!is_empty(&uuid::Uuid::nil()));
    }

    #[test]
    fn raw_json_by_category() {
        assert!(is_empty(&json!(null)));
        assert!(is_empty(&json!([])));
        assert!(is_empty(&json!({})));
        assert!(is_empty(&json!(0)));
        assert!(!is_empty(&json!("a")));
    }
}
