use core::fmt::{self, Debug, Display};
use core::hash::Hash;
use std::collections::HashMap;

use crate::error::TreeError;
use crate::ordered_map::OrderedMap;
use crate::raw::{Handle, RawBTree};
use crate::view::TreeView;

/// An ordered map backed by a classic B-tree of minimum degree `t`.
///
/// The tree itself stores keys only; values live in a hash index keyed by the
/// same keys. Ordered structure and point lookups are therefore served by
/// different stores, and every mutation keeps the two key sets identical.
///
/// Keys must be `Clone` (one copy lives in each store) and `Hash` for the
/// value index.
///
/// ```
/// use treant_maps::{BTreeMap, OrderedMap};
///
/// let mut map = BTreeMap::new();
/// map.insert(1, "one");
/// map.insert(2, "two");
/// assert_eq!(map.get(&1), Some(&"one"));
/// assert_eq!(map.remove(&2), Some("two"));
/// assert_eq!(map.len(), 1);
/// ```
pub struct BTreeMap<K, V> {
    tree: RawBTree<K>,
    values: HashMap<K, V>,
}

/// Smallest minimum degree a B-tree supports.
pub const MIN_BTREE_DEGREE: usize = 2;

impl<K: Ord + Clone + Hash, V> BTreeMap<K, V> {
    /// Creates an empty map with minimum degree 2 (a 2-3-4 tree).
    #[must_use]
    pub fn new() -> Self {
        Self::with_degree(MIN_BTREE_DEGREE).expect("the default degree is valid")
    }

    /// Creates an empty map with minimum degree `degree`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidDegree`] when `degree < 2`; a node must be
    /// able to hold at least one key after a split.
    pub fn with_degree(degree: usize) -> Result<Self, TreeError> {
        if degree < MIN_BTREE_DEGREE {
            return Err(TreeError::InvalidDegree {
                degree,
                minimum: MIN_BTREE_DEGREE,
            });
        }
        Ok(Self {
            tree: RawBTree::new(degree),
            values: HashMap::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    /// Maps `key` to `value`, returning the displaced value for an existing
    /// key. Overwrites touch only the value index; the tree is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.values.get_mut(&key) {
            return Some(core::mem::replace(slot, value));
        }
        self.tree.insert(key.clone());
        self.values.insert(key, value);
        None
    }

    /// Removes `key` from both stores, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.values.remove(key)?;
        self.tree.remove(key);
        Some(value)
    }

    pub fn clear(&mut self) {
        self.tree.clear();
        self.values.clear();
    }

    /// Snapshots the tree structure, one view node per tree node, entries
    /// rendered as `key=value`.
    pub fn export_tree(&self) -> TreeView
    where
        K: Display,
        V: Display,
    {
        self.view_of(self.tree.root())
    }

    fn view_of(&self, handle: Handle) -> TreeView
    where
        K: Display,
        V: Display,
    {
        let node = self.tree.node(handle);
        let label = node
            .keys()
            .iter()
            .map(|key| match self.values.get(key) {
                Some(value) => format!("{key}={value}"),
                None => key.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let children = node.children().iter().map(|&child| self.view_of(child)).collect();
        TreeView::new(label, children)
    }

    /// References to every key, in order. The tree walk yields keys sorted;
    /// values are looked up per key on use.
    fn keys_in_order(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.len());
        self.collect_keys(self.tree.root(), &mut keys);
        keys
    }

    fn collect_keys<'a>(&'a self, handle: Handle, out: &mut Vec<&'a K>) {
        let node = self.tree.node(handle);
        if node.is_leaf() {
            out.extend(node.keys());
            return;
        }
        for (index, &child) in node.children().iter().enumerate() {
            self.collect_keys(child, out);
            if index < node.keys().len() {
                out.push(&node.keys()[index]);
            }
        }
    }
}

impl<K: Ord + Clone + Hash, V> Default for BTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone + Hash + Debug, V: Debug> Debug for BTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.keys_in_order().into_iter().map(|key| (key, &self.values[key])))
            .finish()
    }
}

impl<K: Ord + Clone + Hash, V> FromIterator<(K, V)> for BTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord + Clone + Hash, V> Extend<(K, V)> for BTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord + Clone + Hash, V> OrderedMap<K, V> for BTreeMap<K, V> {
    fn len(&self) -> usize {
        self.len()
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.insert(key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.remove(key)
    }

    fn clear(&mut self) {
        self.clear();
    }

    fn export_tree(&self) -> TreeView
    where
        K: Display,
        V: Display,
    {
        self.export_tree()
    }
}

#[cfg(test)]
impl<K: Ord + Clone + Hash, V> BTreeMap<K, V> {
    /// Panics unless the tree's key set and the value index's key set agree.
    /// Test-only.
    fn validate_stores_in_sync(&self) {
        self.tree.validate_invariants();
        let tree_keys = self.tree.in_order_keys();
        assert_eq!(tree_keys.len(), self.values.len(), "stores hold differing key counts");
        for key in &tree_keys {
            assert!(self.values.contains_key(key), "tree key missing from value index");
        }
    }
}
