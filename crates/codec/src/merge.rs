//! The structural merger.

use crate::{FieldDescriptor, Result};
use policy::Capabilities;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque, btree_map, hash_map};
use std::hash::BuildHasher;
use tracing::trace;

/// Copy a decoded scratch value onto a live one.
///
/// Records copy field by field, consulting each field's write right, and
/// recurse into nested records. Options, boxes, sequences and mappings
/// recurse into the values they hold, so a record's write policy applies
/// however deeply it is nested. Scalars, leaves and any record marked
/// `#[scope(atomic)]` are replaced wholesale.
pub trait Merge: Sized {
    fn merge(&mut self, scratch: Self, capabilities: &Capabilities) -> Result<()>;

    /// Build the value for a slot the target did not have yet: `None`
    /// becoming `Some`, a new sequence element, a new map key.
    ///
    /// Records start from their default and merge the scratch in, so fields
    /// the caller may not write stay at their zero value. Removing a slot
    /// (`Some` to `None`, a shorter sequence) is governed by the enclosing
    /// field's write right alone.
    fn adopt(scratch: Self, _capabilities: &Capabilities) -> Result<Self> {
        Ok(scratch)
    }
}

/// Merge `scratch` into `target` under `capabilities`.
///
/// This is select-and-copy, not a patch: every field the caller may write
/// takes the scratch value, including zero values for fields the wire body
/// left out.
pub fn merge<T: Merge>(scratch: T, target: &mut T, capabilities: &Capabilities) -> Result<()> {
    target.merge(scratch, capabilities)
}

/// Merge one field if the caller holds its write right.
///
/// Called by derived [`Merge`] impls for each field in declaration order.
pub fn merge_field<T: Merge>(
    descriptor: &FieldDescriptor,
    target: &mut T,
    scratch: T,
    capabilities: &Capabilities,
) -> Result<()> {
    if descriptor.may_write(capabilities) {
        target.merge(scratch, capabilities)
    } else {
        trace!(field = descriptor.ident, "write right not held, field kept");
        Ok(())
    }
}

macro_rules! assign {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Merge for $ty {
                fn merge(&mut self, scratch: Self, _capabilities: &Capabilities) -> Result<()> {
                    *self = scratch;
                    Ok(())
                }
            }
        )+
    };
}

assign!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, char, (), String, Value,
);

impl<T: Merge> Merge for Option<T> {
    fn merge(&mut self, scratch: Self, capabilities: &Capabilities) -> Result<()> {
        match scratch {
            None => *self = None,
            Some(incoming) => match self {
                Some(current) => current.merge(incoming, capabilities)?,
                None => *self = Some(T::adopt(incoming, capabilities)?),
            },
        }
        Ok(())
    }

    fn adopt(scratch: Self, capabilities: &Capabilities) -> Result<Self> {
        scratch.map(|value| T::adopt(value, capabilities)).transpose()
    }
}

impl<T: Merge> Merge for Box<T> {
    fn merge(&mut self, scratch: Self, capabilities: &Capabilities) -> Result<()> {
        (**self).merge(*scratch, capabilities)
    }

    fn adopt(scratch: Self, capabilities: &Capabilities) -> Result<Self> {
        T::adopt(*scratch, capabilities).map(Box::new)
    }
}

// Sequences merge by position: surplus target elements are dropped, surplus
// scratch elements are adopted.
impl<T: Merge> Merge for Vec<T> {
    fn merge(&mut self, scratch: Self, capabilities: &Capabilities) -> Result<()> {
        self.truncate(scratch.len());
        let mut incoming = scratch.into_iter();
        for slot in self.iter_mut() {
            if let Some(value) = incoming.next() {
                slot.merge(value, capabilities)?;
            }
        }
        for value in incoming {
            self.push(T::adopt(value, capabilities)?);
        }
        Ok(())
    }

    fn adopt(scratch: Self, capabilities: &Capabilities) -> Result<Self> {
        scratch
            .into_iter()
            .map(|value| T::adopt(value, capabilities))
            .collect()
    }
}

impl<T: Merge> Merge for VecDeque<T> {
    fn merge(&mut self, scratch: Self, capabilities: &Capabilities) -> Result<()> {
        self.truncate(scratch.len());
        let mut incoming = scratch.into_iter();
        for slot in self.iter_mut() {
            if let Some(value) = incoming.next() {
                slot.merge(value, capabilities)?;
            }
        }
        for value in incoming {
            self.push_back(T::adopt(value, capabilities)?);
        }
        Ok(())
    }

    fn adopt(scratch: Self, capabilities: &Capabilities) -> Result<Self> {
        scratch
            .into_iter()
            .map(|value| T::adopt(value, capabilities))
            .collect()
    }
}

impl<T: Merge + Default, const N: usize> Merge for [T; N] {
    fn merge(&mut self, scratch: Self, capabilities: &Capabilities) -> Result<()> {
        for (slot, value) in self.iter_mut().zip(scratch) {
            slot.merge(value, capabilities)?;
        }
        Ok(())
    }

    fn adopt(scratch: Self, capabilities: &Capabilities) -> Result<Self> {
        let mut out: [T; N] = std::array::from_fn(|_| T::default());
        for (slot, value) in out.iter_mut().zip(scratch) {
            *slot = T::adopt(value, capabilities)?;
        }
        Ok(out)
    }
}

// Mappings merge by key: keys missing from the scratch are dropped, new keys
// are adopted.
impl<T: Merge> Merge for BTreeMap<String, T> {
    fn merge(&mut self, scratch: Self, capabilities: &Capabilities) -> Result<()> {
        self.retain(|key, _| scratch.contains_key(key));
        for (key, value) in scratch {
            match self.entry(key) {
                btree_map::Entry::Occupied(mut slot) => {
                    slot.get_mut().merge(value, capabilities)?;
                }
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(T::adopt(value, capabilities)?);
                }
            }
        }
        Ok(())
    }

    fn adopt(scratch: Self, capabilities: &Capabilities) -> Result<Self> {
        scratch
            .into_iter()
            .map(|(key, value)| T::adopt(value, capabilities).map(|value| (key, value)))
            .collect()
    }
}

impl<T: Merge, S: BuildHasher + Default> Merge for HashMap<String, T, S> {
    fn merge(&mut self, scratch: Self, capabilities: &Capabilities) -> Result<()> {
        self.retain(|key, _| scratch.contains_key(key));
        for (key, value) in scratch {
            match self.entry(key) {
                hash_map::Entry::Occupied(mut slot) => {
                    slot.get_mut().merge(value, capabilities)?;
                }
                hash_map::Entry::Vacant(slot) => {
                    slot.insert(T::adopt(value, capabilities)?);
                }
            }
        }
        Ok(())
    }

    fn adopt(scratch: Self, capabilities: &Capabilities) -> Result<Self> {
        scratch
            .into_iter()
            .map(|(key, value)| T::adopt(value, capabilities).map(|value| (key, value)))
            .collect()
    }
}
