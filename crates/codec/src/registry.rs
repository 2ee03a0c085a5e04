//! Process-wide descriptor table, keyed by record type.

use crate::{FieldDescriptor, Record};
use parking_lot::RwLock;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

type Table = HashMap<TypeId, &'static [FieldDescriptor]>;

static TABLE: LazyLock<RwLock<Table>> = LazyLock::new(|| RwLock::new(HashMap::new()));

/// Resolved descriptors for `T`, built on first use.
///
/// Each type is resolved at most once per process: the slow path re-checks
/// under the write lock, so concurrent first calls agree on one slice.
pub fn descriptors<T: Record>() -> &'static [FieldDescriptor] {
    let id = TypeId::of::<T>();
    if let Some(found) = TABLE.read().get(&id).copied() {
        return found;
    }

    let mut table = TABLE.write();
    *table.entry(id).or_insert_with(|| {
        let resolved: Vec<_> = T::field_specs()
            .iter()
            .map(FieldDescriptor::resolve)
            .collect();
        debug!(
            record = type_name::<T>(),
            fields = resolved.len(),
            "resolved field descriptors"
        );
        let leaked: &'static [FieldDescriptor] = Box::leak(resolved.into_boxed_slice());
        leaked
    })
}

/// Number of record types resolved so far.
#[cfg(test)]
pub(crate) fn resolved_types() -> usize {
    TABLE.read().len()
}
