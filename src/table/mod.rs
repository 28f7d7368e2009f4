use inetnum::addr::Prefix;
use log::trace;

use crate::stride::{addr_into_path, canonical};
use crate::trie::Node;

mod persist;
mod query;
#[cfg(test)]
mod tests;

//------------ Table --------------------------------------------------------

/// A table of IP prefixes with associated values of type `V`, supporting
/// exact and longest-prefix-match retrieval for both address families.
///
/// The table is single-writer: mutations must be serialized by the caller.
/// Read methods on a stable table may run in parallel. For multi-reader /
/// single-writer setups use the `*_persist` methods, which leave the
/// receiver untouched and return a new table sharing all untouched
/// sub-trees with it; readers can keep using old tables indefinitely.
///
/// Prefixes are normalized on the way in: host bits beyond the prefix
/// length are cleared, so `10.0.0.1/8` and `10.0.0.0/8` address the same
/// entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Table<V> {
    root4: Node<V>,
    root6: Node<V>,
    size4: usize,
    size6: usize,
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Table<V> {
    /// Create an empty table.
    pub fn new() -> Self {
        Table {
            root4: Node::new(),
            root6: Node::new(),
            size4: 0,
            size6: 0,
        }
    }

    /// The number of prefixes in the table.
    pub fn len(&self) -> usize {
        self.size4 + self.size6
    }

    /// The number of IPv4 prefixes in the table.
    pub fn len_v4(&self) -> usize {
        self.size4
    }

    /// The number of IPv6 prefixes in the table.
    pub fn len_v6(&self) -> usize {
        self.size6
    }

    pub fn is_empty(&self) -> bool {
        self.size4 == 0 && self.size6 == 0
    }

    pub(crate) fn root(&self, is4: bool) -> &Node<V> {
        if is4 {
            &self.root4
        } else {
            &self.root6
        }
    }

    /// Get the value for this exact prefix.
    pub fn get(&self, pfx: &Prefix) -> Option<&V> {
        let pfx = canonical(*pfx);
        self.root(pfx.is_v4()).get_at_depth(&pfx, 0)
    }
}

impl<V: Clone> Table<V> {
    /// Insert a prefix/value pair. An existing value for the same prefix
    /// is replaced; the return value tells whether that happened.
    pub fn insert(&mut self, pfx: &Prefix, value: V) -> bool {
        let pfx = canonical(*pfx);
        trace!("insert {}", pfx);
        let (root, size) = if pfx.is_v4() {
            (&mut self.root4, &mut self.size4)
        } else {
            (&mut self.root6, &mut self.size6)
        };
        let exists = root.insert_at_depth(pfx, value, 0);
        if !exists {
            *size += 1;
        }
        exists
    }

    /// Remove a prefix, returning its value. Sub-trees left with a single
    /// entry are compressed back into the parent on the way out.
    pub fn remove(&mut self, pfx: &Prefix) -> Option<V> {
        let pfx = canonical(*pfx);
        trace!("remove {}", pfx);
        let (path, _, is4) = addr_into_path(pfx.addr());
        let (root, size) = if is4 {
            (&mut self.root4, &mut self.size4)
        } else {
            (&mut self.root6, &mut self.size6)
        };
        let value = root.remove_at_depth(&pfx, &path, 0)?;
        *size -= 1;
        Some(value)
    }

    /// Insert or update the value for a prefix in a single descent. The
    /// callback receives the present value, if any, and returns the new
    /// one. Returns the stored value and whether the prefix was present.
    pub fn update<F>(&mut self, pfx: &Prefix, f: F) -> (&V, bool)
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let pfx = canonical(*pfx);
        trace!("update {}", pfx);
        let (root, size) = if pfx.is_v4() {
            (&mut self.root4, &mut self.size4)
        } else {
            (&mut self.root6, &mut self.size6)
        };
        let (value, was_present) = root.update_at_depth(pfx, f, 0);
        if !was_present {
            *size += 1;
        }
        (value, was_present)
    }

    /// Merge all entries of `other` into this table. On prefixes present
    /// in both, the value of `other` wins.
    pub fn union(&mut self, other: &Self) {
        let dup4 = self.root4.union_rec(&other.root4, 0);
        let dup6 = self.root6.union_rec(&other.root6, 0);
        self.size4 += other.size4 - dup4;
        self.size6 += other.size6 - dup6;
    }
}
