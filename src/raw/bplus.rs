use smallvec::{SmallVec, smallvec};

use super::arena::Arena;
use super::handle::Handle;

// Inline capacity for node storage; the order is a runtime parameter, so the
// fan-out bound is a checked invariant rather than the array size.
type Keys<K> = SmallVec<[K; 8]>;
type Values<V> = SmallVec<[V; 8]>;
type Children = SmallVec<[Handle; 8]>;

/// A B+-tree node: internal nodes route by separator keys, leaves hold the
/// key/value pairs themselves.
pub(crate) enum Node<K, V> {
    Internal(InternalNode<K>),
    Leaf(LeafNode<K, V>),
}

/// Separator keys and `keys.len() + 1` child handles. A separator equals the
/// smallest key that routing sends into its right subtree, so an exact match
/// during routing descends to the right of the matched key.
pub(crate) struct InternalNode<K> {
    keys: Keys<K>,
    children: Children,
}

/// Sorted key/value pairs plus a non-owning link to the leaf holding the next
/// higher key range. The links form a singly linked chain across all leaves.
pub(crate) struct LeafNode<K, V> {
    next: Option<Handle>,
    keys: Keys<K>,
    values: Values<V>,
}

impl<K, V> Node<K, V> {
    fn as_internal(&self) -> &InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    fn as_internal_mut(&mut self) -> &mut InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    fn as_leaf_mut(&mut self) -> &mut LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }
}

impl<K> InternalNode<K> {
    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    /// Index of the child whose subtree owns `key`.
    fn route(&self, key: &K) -> usize
    where
        K: Ord,
    {
        match self.keys.binary_search(key) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }
}

impl<K, V> LeafNode<K, V> {
    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    pub(crate) fn values(&self) -> &[V] {
        &self.values
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }
}

/// The core B+-tree backing `BPlusTreeMap`.
///
/// `degree` bounds fan-out: an internal node holds at most `degree` children,
/// a leaf at most `degree - 1` entries. Underflow thresholds are
/// `(degree + 1) / 2` children and `degree / 2` entries respectively; the
/// root is exempt. The root starts as an empty leaf and is reseated when it
/// splits (tree grows) or when an internal root runs out of separators after
/// a merge (tree shrinks).
pub(crate) struct RawBPlusTree<K, V> {
    degree: usize,
    nodes: Arena<Node<K, V>>,
    root: Handle,
    len: usize,
}

impl<K, V> RawBPlusTree<K, V> {
    /// Creates an empty tree. The caller validates `degree >= 3`.
    pub(crate) fn new(degree: usize) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::Leaf(LeafNode {
            next: None,
            keys: SmallVec::new(),
            values: SmallVec::new(),
        }));
        Self {
            degree,
            nodes,
            root,
            len: 0,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn root(&self) -> Handle {
        self.root
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    /// Drops every node and reseats an empty leaf root.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(Node::Leaf(LeafNode {
            next: None,
            keys: SmallVec::new(),
            values: SmallVec::new(),
        }));
        self.len = 0;
    }

    /// Handle of the leftmost leaf, the head of the leaf chain.
    pub(crate) fn first_leaf(&self) -> Handle {
        let mut current = self.root;
        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => current = internal.children[0],
                Node::Leaf(_) => return current,
            }
        }
    }

    fn is_overflowing(&self, handle: Handle) -> bool {
        match self.nodes.get(handle) {
            Node::Internal(internal) => internal.children.len() > self.degree,
            Node::Leaf(leaf) => leaf.keys.len() > self.degree - 1,
        }
    }

    fn is_underflowing(&self, handle: Handle) -> bool {
        match self.nodes.get(handle) {
            Node::Internal(internal) => internal.children.len() < (self.degree + 1) / 2,
            Node::Leaf(leaf) => leaf.keys.len() < self.degree / 2,
        }
    }
}

impl<K: Ord + Clone, V> RawBPlusTree<K, V> {
    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        let mut current = self.root;
        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => current = internal.children[internal.route(key)],
                Node::Leaf(leaf) => {
                    return match leaf.keys.binary_search(key) {
                        Ok(index) => Some(&leaf.values[index]),
                        Err(_) => None,
                    };
                }
            }
        }
    }

    /// Inserts or overwrites, returning the previous value for the key.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.insert_rec(self.root, key, value);
        if previous.is_none() {
            self.len += 1;
        }

        if self.is_overflowing(self.root) {
            // Grow a new root holding the split halves of the old one.
            let (separator, right) = self.split_node(self.root);
            let internal = InternalNode {
                keys: smallvec![separator],
                children: smallvec![self.root, right],
            };
            self.root = self.nodes.alloc(Node::Internal(internal));
        }
        previous
    }

    fn insert_rec(&mut self, node: Handle, key: K, value: V) -> Option<V> {
        let (index, child) = match self.nodes.get_mut(node) {
            Node::Leaf(leaf) => {
                return match leaf.keys.binary_search(&key) {
                    Ok(index) => Some(core::mem::replace(&mut leaf.values[index], value)),
                    Err(index) => {
                        leaf.keys.insert(index, key);
                        leaf.values.insert(index, value);
                        None
                    }
                };
            }
            Node::Internal(internal) => {
                let index = internal.route(&key);
                (index, internal.children[index])
            }
        };

        let previous = self.insert_rec(child, key, value);
        if self.is_overflowing(child) {
            let (separator, right) = self.split_node(child);
            let internal = self.nodes.get_mut(node).as_internal_mut();
            internal.keys.insert(index, separator);
            internal.children.insert(index + 1, right);
        }
        previous
    }

    /// Splits an overflowing node, allocating the upper half as a new right
    /// sibling. Returns the separator to push into the parent and the new
    /// sibling's handle.
    ///
    /// For a leaf the separator is a copy of the new sibling's first key (the
    /// key stays in the leaf) and the chain is relinked around the pair. For
    /// an internal node the key at the split boundary moves up and is removed
    /// from both halves.
    fn split_node(&mut self, node: Handle) -> (K, Handle) {
        let (separator, right) = match self.nodes.get_mut(node) {
            Node::Leaf(leaf) => {
                let from = leaf.keys.len().div_ceil(2);
                let keys: Keys<K> = leaf.keys.drain(from..).collect();
                let values: Values<V> = leaf.values.drain(from..).collect();
                let separator = keys[0].clone();
                let right = Node::Leaf(LeafNode {
                    next: leaf.next.take(),
                    keys,
                    values,
                });
                (separator, right)
            }
            Node::Internal(internal) => {
                let from = internal.keys.len() / 2 + 1;
                let keys: Keys<K> = internal.keys.drain(from..).collect();
                let children: Children = internal.children.drain(from..).collect();
                let separator = internal.keys.pop().expect("split node holds at least one key");
                (separator, Node::Internal(InternalNode { keys, children }))
            }
        };

        let right_handle = self.nodes.alloc(right);
        if let Node::Leaf(leaf) = self.nodes.get_mut(node) {
            leaf.next = Some(right_handle);
        }
        (separator, right_handle)
    }

    /// Smallest key in the subtree rooted at `node`.
    fn subtree_min_key(&self, mut node: Handle) -> &K {
        loop {
            match self.nodes.get(node) {
                Node::Internal(internal) => node = internal.children[0],
                Node::Leaf(leaf) => {
                    return leaf.keys.first().expect("merge candidates hold at least one key");
                }
            }
        }
    }

    /// Removes a key, returning its value; a no-op for absent keys.
    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.remove_rec(self.root, key)?;
        self.len -= 1;

        // Shrink: an internal root drained of separators collapses into its
        // sole remaining child.
        if let Node::Internal(internal) = self.nodes.get(self.root)
            && internal.keys.is_empty()
        {
            let child = internal.children[0];
            self.nodes.free(self.root);
            self.root = child;
        }
        Some(removed)
    }

    fn remove_rec(&mut self, node: Handle, key: &K) -> Option<V> {
        let (index, child) = match self.nodes.get_mut(node) {
            Node::Leaf(leaf) => {
                return match leaf.keys.binary_search(key) {
                    Ok(index) => {
                        leaf.keys.remove(index);
                        Some(leaf.values.remove(index))
                    }
                    Err(_) => None,
                };
            }
            Node::Internal(internal) => {
                let index = internal.route(key);
                (index, internal.children[index])
            }
        };

        let removed = self.remove_rec(child, key)?;
        if self.is_underflowing(child) {
            self.resolve_underflow(node, index);
        }
        Some(removed)
    }

    /// Merges the underflowing child at `child_index` with its left sibling
    /// when one exists, else its right sibling, removing the separator and
    /// the emptied slot from the parent. If the merged node overflows it is
    /// immediately re-split, which redistributes the pair.
    fn resolve_underflow(&mut self, parent: Handle, child_index: usize) {
        let separator_index = if child_index > 0 { child_index - 1 } else { child_index };
        let (left, right) = {
            let internal = self.nodes.get(parent).as_internal();
            (internal.children[separator_index], internal.children[separator_index + 1])
        };

        // Routing consumed the separator on the way down; an internal merge
        // reintroduces one between the two key runs, the smallest key still
        // reachable under the right sibling.
        let separator = match self.nodes.get(right) {
            Node::Leaf(_) => None,
            Node::Internal(_) => Some(self.subtree_min_key(right).clone()),
        };

        match self.nodes.take(right) {
            Node::Leaf(mut right_leaf) => {
                let left_leaf = self.nodes.get_mut(left).as_leaf_mut();
                left_leaf.keys.append(&mut right_leaf.keys);
                left_leaf.values.append(&mut right_leaf.values);
                // Splice the chain over the removed leaf.
                left_leaf.next = right_leaf.next;
            }
            Node::Internal(mut right_internal) => {
                let left_internal = self.nodes.get_mut(left).as_internal_mut();
                left_internal.keys.push(separator.expect("internal sibling yields a separator"));
                left_internal.keys.append(&mut right_internal.keys);
                left_internal.children.append(&mut right_internal.children);
            }
        }

        let internal = self.nodes.get_mut(parent).as_internal_mut();
        internal.keys.remove(separator_index);
        internal.children.remove(separator_index + 1);

        if self.is_overflowing(left) {
            let (separator, right_handle) = self.split_node(left);
            let internal = self.nodes.get_mut(parent).as_internal_mut();
            internal.keys.insert(separator_index, separator);
            internal.children.insert(separator_index + 1, right_handle);
        }
    }
}

#[cfg(test)]
impl<K: Ord + Clone, V> RawBPlusTree<K, V> {
    /// Panics if any structural invariant is violated. Test-only.
    pub(crate) fn validate_invariants(&self) {
        let mut leaf_depth = None;
        let mut leaves = Vec::new();
        self.validate_node(self.root, 0, &mut leaf_depth, &mut leaves);

        // The chain from the leftmost leaf must visit exactly the leaves of
        // the tree, left to right.
        let mut chained = Vec::new();
        let mut current = Some(self.first_leaf());
        while let Some(handle) = current {
            chained.push(handle);
            current = match self.nodes.get(handle) {
                Node::Leaf(leaf) => leaf.next,
                Node::Internal(_) => panic!("leaf chain links to an internal node"),
            };
        }
        assert_eq!(chained, leaves, "leaf chain does not match tree order");

        // Keys across the chain are globally sorted and account for len.
        let chain_keys = self.chain_keys();
        for window in chain_keys.windows(2) {
            assert!(window[0] < window[1], "leaf chain keys not strictly sorted");
        }
        assert_eq!(chain_keys.len(), self.len, "len does not match leaf entries");
    }

    /// Every key in leaf-chain order. Test-only.
    pub(crate) fn chain_keys(&self) -> Vec<K> {
        let mut keys = Vec::new();
        let mut current = Some(self.first_leaf());
        while let Some(handle) = current {
            match self.nodes.get(handle) {
                Node::Leaf(leaf) => {
                    keys.extend(leaf.keys.iter().cloned());
                    current = leaf.next;
                }
                Node::Internal(_) => panic!("leaf chain links to an internal node"),
            }
        }
        keys
    }

    /// Returns the subtree's (min, max) keys and records leaves in order.
    fn validate_node(
        &self,
        handle: Handle,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        leaves: &mut Vec<Handle>,
    ) -> Option<(K, K)> {
        match self.nodes.get(handle) {
            Node::Leaf(leaf) => {
                match *leaf_depth {
                    None => *leaf_depth = Some(depth),
                    Some(expected) => assert_eq!(depth, expected, "leaves at differing depths"),
                }
                assert_eq!(leaf.keys.len(), leaf.values.len(), "leaf keys/values out of step");
                assert!(leaf.keys.len() <= self.degree - 1, "leaf exceeds degree-1 entries");
                if handle != self.root {
                    assert!(leaf.keys.len() >= self.degree / 2, "non-root leaf underflows");
                }
                leaves.push(handle);
                Some((leaf.keys.first()?.clone(), leaf.keys.last()?.clone()))
            }
            Node::Internal(internal) => {
                assert_eq!(
                    internal.children.len(),
                    internal.keys.len() + 1,
                    "child count != key count + 1"
                );
                assert!(internal.children.len() <= self.degree, "internal exceeds degree children");
                let minimum = if handle == self.root { 2 } else { (self.degree + 1) / 2 };
                assert!(internal.children.len() >= minimum, "internal node underflows");

                let mut bounds = None;
                for (index, &child) in internal.children.iter().enumerate() {
                    let child_bounds = self.validate_node(child, depth + 1, leaf_depth, leaves);
                    if let Some((child_min, child_max)) = child_bounds {
                        // Separators bound their subtrees: everything left of
                        // keys[i] is smaller, everything right is >= keys[i].
                        if index > 0 {
                            assert!(
                                internal.keys[index - 1] <= child_min,
                                "separator exceeds right subtree minimum"
                            );
                        }
                        if index < internal.keys.len() {
                            assert!(
                                child_max < internal.keys[index],
                                "left subtree reaches past its separator"
                            );
                        }
                        bounds = match bounds {
                            None => Some((child_min, child_max)),
                            Some((min, _)) => Some((min, child_max)),
                        };
                    }
                }
                bounds
            }
        }
    }
}
