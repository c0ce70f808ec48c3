use core::fmt::Display;

use crate::view::TreeView;

/// The contract shared by both map engines.
///
/// Both [`BTreeMap`](crate::BTreeMap) and
/// [`BPlusTreeMap`](crate::BPlusTreeMap) implement this trait with identical
/// observable behavior; they differ only in the shape of the tree behind it
/// (and therefore in what [`export_tree`](OrderedMap::export_tree) shows).
pub trait OrderedMap<K: Ord, V> {
    /// Number of key/value pairs in the map.
    fn len(&self) -> usize;

    /// `true` when the map holds no pairs.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the value mapped to `key`, if present.
    fn get(&self, key: &K) -> Option<&V>;

    /// Maps `key` to `value`, returning the displaced value if the key was
    /// already present. Overwriting never changes [`len`](OrderedMap::len).
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Removes `key`, returning its value; absent keys are a no-op.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Drops every pair, leaving an empty map.
    fn clear(&mut self);

    /// Snapshots the tree structure for display or inspection.
    fn export_tree(&self) -> TreeView
    where
        K: Display,
        V: Display;
}
