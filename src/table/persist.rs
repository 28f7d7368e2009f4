use inetnum::addr::Prefix;

use super::Table;

//------------ Persistent mutations -----------------------------------------

// The persistent siblings leave the receiver untouched and return a new
// table. Both tables share every sub-tree the mutation did not visit: the
// roots are cloned flat (their child slots keep pointing at the shared
// sub-nodes) and the descent copies a node on write exactly when it is
// still shared, courtesy of Arc::make_mut. Old roots remain valid for
// concurrent readers for as long as they are kept around; swapping a root
// reference is the embedder's business.

impl<V: Clone> Table<V> {
    /// Like [`insert`](Self::insert), but returns the modified table and
    /// leaves `self` unchanged.
    #[must_use]
    pub fn insert_persist(&self, pfx: &Prefix, value: V) -> (Self, bool) {
        let mut table = self.clone();
        let exists = table.insert(pfx, value);
        (table, exists)
    }

    /// Like [`remove`](Self::remove), but returns the modified table and
    /// leaves `self` unchanged.
    #[must_use]
    pub fn remove_persist(&self, pfx: &Prefix) -> (Self, Option<V>) {
        let mut table = self.clone();
        let value = table.remove(pfx);
        (table, value)
    }

    /// Like [`update`](Self::update), but returns the modified table and
    /// leaves `self` unchanged.
    #[must_use]
    pub fn update_persist<F>(&self, pfx: &Prefix, f: F) -> (Self, bool)
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let mut table = self.clone();
        let (_, was_present) = table.update(pfx, f);
        (table, was_present)
    }

    /// Like [`union`](Self::union), but returns the merged table and
    /// leaves `self` unchanged.
    #[must_use]
    pub fn union_persist(&self, other: &Self) -> Self {
        let mut table = self.clone();
        table.union(other);
        table
    }
}
