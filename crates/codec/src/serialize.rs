//! The structural serializer.

use crate::{Error, Record, Result, Scoped, Shape, is_empty};
use policy::Capabilities;
use serde_json::{Map, Value};
use tracing::trace;

/// Project `value` into a wire value, keeping only what `capabilities` may read.
///
/// Sequences keep their order and fail as a whole if any element fails.
/// An absent optional becomes `null`. Leaves encode themselves; scalars pass
/// through.
pub fn serialize(value: &dyn Scoped, capabilities: &Capabilities) -> Result<Value> {
    match value.shape() {
        Shape::Scalar(scalar) => Ok(scalar),
        Shape::Leaf(leaf) => leaf.encode().map_err(Error::Encode),
        Shape::Optional(None) => Ok(Value::Null),
        Shape::Optional(Some(inner)) => serialize(inner, capabilities),
        Shape::Sequence(items) => items
            .into_iter()
            .map(|item| serialize(item, capabilities))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Shape::Mapping(entries) => {
            let mut out = Map::with_capacity(entries.len());
            for (key, item) in entries {
                out.insert(key.to_string(), serialize(item, capabilities)?);
            }
            Ok(Value::Object(out))
        }
        Shape::Record(record) => {
            let mut out = Map::new();
            serialize_record(record, capabilities, &mut out)?;
            Ok(Value::Object(out))
        }
    }
}

/// Serialize a record into a wire tree.
///
/// Fails with [`Error::NotRecord`] if `value` is not record-shaped.
pub fn to_tree(value: &dyn Scoped, capabilities: &Capabilities) -> Result<Map<String, Value>> {
    match value.shape() {
        Shape::Record(record) => {
            let mut out = Map::new();
            serialize_record(record, capabilities, &mut out)?;
            Ok(out)
        }
        _ => Err(Error::NotRecord {
            context: "top-level value".to_string(),
        }),
    }
}

/// Serialize `value` straight to JSON bytes.
pub fn to_vec(value: &dyn Scoped, capabilities: &Capabilities) -> Result<Vec<u8>> {
    let tree = serialize(value, capabilities)?;
    serde_json::to_vec(&tree).map_err(Error::Encode)
}

/// Write the readable fields of `record` into `out`.
///
/// Embedded fields write into the same `out`, so embedding flattens through
/// any depth. When two fields resolve to one name the later field in
/// declaration order wins.
fn serialize_record(
    record: &dyn Record,
    capabilities: &Capabilities,
    out: &mut Map<String, Value>,
) -> Result<()> {
    for (descriptor, field) in record.descriptors().iter().zip(record.fields()) {
        let Some(name) = descriptor.wire_name() else {
            continue;
        };
        if !descriptor.may_read(capabilities) {
            trace!(field = descriptor.ident, "read right not held, field omitted");
            continue;
        }
        if descriptor.omit_empty && is_empty(field) {
            continue;
        }
        if descriptor.embedded {
            splice(field, descriptor.ident, capabilities, out)?;
            continue;
        }
        out.insert(name.to_string(), serialize(field, capabilities)?);
    }
    Ok(())
}

fn splice(
    field: &dyn Scoped,
    ident: &str,
    capabilities: &Capabilities,
    out: &mut Map<String, Value>,
) -> Result<()> {
    match field.shape() {
        Shape::Record(record) => serialize_record(record, capabilities, out),
        Shape::Optional(Some(inner)) => splice(inner, ident, capabilities, out),
        Shape::Optional(None) => Ok(()),
        Shape::Mapping(entries) => {
            for (key, item) in entries {
                out.insert(key.to_string(), serialize(item, capabilities)?);
            }
            Ok(())
        }
        _ => Err(Error::NotRecord {
            context: format!("embedded field `{ident}`"),
        }),
    }
}
