use core::fmt::{self, Debug, Display};

use crate::error::TreeError;
use crate::ordered_map::OrderedMap;
use crate::raw::{BPlusNode, Handle, RawBPlusTree};
use crate::view::TreeView;

/// An ordered map backed by a B+-tree of the given order.
///
/// All key/value pairs live in the leaves; internal nodes hold separator keys
/// only. The leaves form a singly linked chain in ascending key order, which
/// [`iter`](BPlusTreeMap::iter) walks without touching internal nodes.
///
/// ```
/// use treant_maps::{BPlusTreeMap, OrderedMap};
///
/// let mut map = BPlusTreeMap::new();
/// for key in [3, 1, 2] {
///     map.insert(key, key * 10);
/// }
/// let pairs: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
/// assert_eq!(pairs, [(1, 10), (2, 20), (3, 30)]);
/// ```
pub struct BPlusTreeMap<K, V> {
    tree: RawBPlusTree<K, V>,
}

/// Smallest order a B+-tree supports.
pub const MIN_BPLUS_DEGREE: usize = 3;

/// Default order used by [`BPlusTreeMap::new`].
pub const DEFAULT_BPLUS_DEGREE: usize = 4;

impl<K: Ord + Clone, V> BPlusTreeMap<K, V> {
    /// Creates an empty map of order 4.
    #[must_use]
    pub fn new() -> Self {
        Self::with_degree(DEFAULT_BPLUS_DEGREE).expect("the default degree is valid")
    }

    /// Creates an empty map of order `degree` (maximum children per internal
    /// node; leaves hold up to `degree - 1` entries).
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidDegree`] when `degree < 3`; order 2 nodes
    /// cannot split into two non-empty halves.
    pub fn with_degree(degree: usize) -> Result<Self, TreeError> {
        if degree < MIN_BPLUS_DEGREE {
            return Err(TreeError::InvalidDegree {
                degree,
                minimum: MIN_BPLUS_DEGREE,
            });
        }
        Ok(Self {
            tree: RawBPlusTree::new(degree),
        })
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.tree.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.tree.get(key).is_some()
    }

    /// Maps `key` to `value`, returning the displaced value for an existing
    /// key.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.tree.insert(key, value)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.tree.remove(key)
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Iterates over all pairs in ascending key order by following the leaf
    /// chain.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: &self.tree,
            leaf: Some(self.tree.first_leaf()),
            index: 0,
            remaining: self.tree.len(),
        }
    }

    /// Snapshots the tree structure, one view node per tree node. Leaf
    /// entries render as `key=value`, internal separators as bare keys.
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
        match self.tree.node(handle) {
            BPlusNode::Leaf(leaf) => {
                let label = leaf
                    .keys()
                    .iter()
                    .zip(leaf.values())
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                TreeView::new(label, Vec::new())
            }
            BPlusNode::Internal(internal) => {
                let label = internal
                    .keys()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                let children = internal.children().iter().map(|&child| self.view_of(child)).collect();
                TreeView::new(label, children)
            }
        }
    }
}

/// Iterator over a [`BPlusTreeMap`]'s pairs in ascending key order.
pub struct Iter<'a, K, V> {
    tree: &'a RawBPlusTree<K, V>,
    leaf: Option<Handle>,
    index: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let handle = self.leaf?;
            let BPlusNode::Leaf(leaf) = self.tree.node(handle) else {
                unreachable!("the leaf chain only links leaves");
            };
            if let Some(key) = leaf.keys().get(self.index) {
                let value = &leaf.values()[self.index];
                self.index += 1;
                self.remaining -= 1;
                return Some((key, value));
            }
            self.leaf = leaf.next();
            self.index = 0;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K: Ord + Clone, V> IntoIterator for &'a BPlusTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord + Clone, V> Default for BPlusTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone + Debug, V: Debug> Debug for BPlusTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord + Clone, V> FromIterator<(K, V)> for BPlusTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord + Clone, V> Extend<(K, V)> for BPlusTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord + Clone, V> OrderedMap<K, V> for BPlusTreeMap<K, V> {
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
