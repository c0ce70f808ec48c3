use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;

// Inline capacity for node storage. The minimum degree is chosen at runtime,
// so the capacity bound (2t-1 keys, 2t children) is a checked invariant rather
// than the array size; nodes of degree <= 4 stay inline, larger degrees spill.
type Keys<K> = SmallVec<[K; 8]>;
type Children = SmallVec<[Handle; 8]>;

/// A classic B-tree node: sorted keys and, for internal nodes, exactly
/// `keys.len() + 1` child handles. A node is a leaf iff it has no children.
///
/// The tree stores keys only. Values never enter the structure; they live in
/// the owning map's value index.
pub(crate) struct BTreeNode<K> {
    keys: Keys<K>,
    children: Children,
}

impl<K> BTreeNode<K> {
    fn new() -> Self {
        Self {
            keys: SmallVec::new(),
            children: SmallVec::new(),
        }
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The structural key-set B-tree of minimum degree `t` backing `BTreeMap`.
///
/// Invariants maintained by every operation:
/// - keys within a node are strictly increasing;
/// - every non-root node holds between `t - 1` and `2t - 1` keys;
/// - all leaves sit at the same depth;
/// - child `i` of an internal node covers exactly the open key interval
///   between `keys[i - 1]` and `keys[i]`.
pub(crate) struct RawBTree<K> {
    degree: usize,
    nodes: Arena<BTreeNode<K>>,
    root: Handle,
}

impl<K> RawBTree<K> {
    /// Creates an empty tree. The caller validates `degree >= 2`.
    pub(crate) fn new(degree: usize) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(BTreeNode::new());
        Self { degree, nodes, root }
    }

    pub(crate) fn root(&self) -> Handle {
        self.root
    }

    pub(crate) fn node(&self, handle: Handle) -> &BTreeNode<K> {
        self.nodes.get(handle)
    }

    /// Drops every node and reseats an empty leaf root.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(BTreeNode::new());
    }

    fn max_keys(&self) -> usize {
        2 * self.degree - 1
    }
}

impl<K: Ord + Clone> RawBTree<K> {
    /// Inserts a key known to be absent, splitting full nodes on the way down
    /// so the receiving node always has room.
    pub(crate) fn insert(&mut self, key: K) {
        if self.nodes.get(self.root).keys.len() == self.max_keys() {
            // Full root: grow a fresh root above it, then split the old root
            // as its only child. The new root ends up with exactly one key.
            let old_root = self.root;
            let new_root = self.nodes.alloc(BTreeNode::new());
            self.nodes.get_mut(new_root).children.push(old_root);
            self.root = new_root;
            self.split_child(new_root, 0);
        }
        self.insert_non_full(self.root, key);
    }

    /// Splits the full child at `parent.children[index]`, pushing its median
    /// key into `parent` and the upper half into a freshly allocated sibling.
    fn split_child(&mut self, parent: Handle, index: usize) {
        let t = self.degree;
        let child_handle = self.nodes.get(parent).children[index];
        let child = self.nodes.get_mut(child_handle);

        let right_children: Children = if child.is_leaf() {
            SmallVec::new()
        } else {
            child.children.drain(t..).collect()
        };
        let right_keys: Keys<K> = child.keys.drain(t..).collect();
        let median = child.keys.pop().expect("a full node holds 2t-1 keys");

        let right = self.nodes.alloc(BTreeNode {
            keys: right_keys,
            children: right_children,
        });
        let parent = self.nodes.get_mut(parent);
        parent.keys.insert(index, median);
        parent.children.insert(index + 1, right);
    }

    fn insert_non_full(&mut self, node: Handle, key: K) {
        let mut index = match self.nodes.get(node).keys.binary_search(&key) {
            // Present keys are filtered by the owning map; nothing to do.
            Ok(_) => return,
            Err(index) => index,
        };

        if self.nodes.get(node).is_leaf() {
            self.nodes.get_mut(node).keys.insert(index, key);
            return;
        }

        let child = self.nodes.get(node).children[index];
        if self.nodes.get(child).keys.len() == self.max_keys() {
            self.split_child(node, index);
            if key > self.nodes.get(node).keys[index] {
                index += 1;
            }
        }
        let child = self.nodes.get(node).children[index];
        self.insert_non_full(child, key);
    }

    /// Removes a key known to be present from the subtree at the root.
    pub(crate) fn remove(&mut self, key: &K) {
        self.remove_rec(self.root, key);
    }

    fn remove_rec(&mut self, node: Handle, key: &K) {
        let t = self.degree;
        match self.nodes.get(node).keys.binary_search(key) {
            Ok(index) => {
                if self.nodes.get(node).is_leaf() {
                    self.nodes.get_mut(node).keys.remove(index);
                    return;
                }

                // Replace the key with its in-order predecessor or successor
                // when the adjacent child can spare one.
                let left = self.nodes.get(node).children[index];
                if self.nodes.get(left).keys.len() >= t {
                    let predecessor = self.max_key(left).clone();
                    self.remove_rec(left, &predecessor);
                    self.nodes.get_mut(node).keys[index] = predecessor;
                    return;
                }

                let right = self.nodes.get(node).children[index + 1];
                if self.nodes.get(right).keys.len() >= t {
                    let successor = self.min_key(right).clone();
                    self.remove_rec(right, &successor);
                    self.nodes.get_mut(node).keys[index] = successor;
                    return;
                }

                // Both neighbors at minimum: fold the key and the right child
                // into the left child, then continue the delete inside it.
                let merged = self.merge_children(node, index);
                self.remove_rec(merged, key);
            }
            Err(index) => {
                if self.nodes.get(node).is_leaf() {
                    // Absent key; the owning map filters these, so this is a
                    // no-op rather than an error.
                    return;
                }
                let target = self.fill_child(node, index);
                self.remove_rec(target, key);
            }
        }
    }

    /// Ensures `children[index]` holds at least `t` keys before a delete
    /// descends into it, borrowing from a sibling or merging. Returns the
    /// node to descend into, which is the merged node when a merge happened.
    fn fill_child(&mut self, node: Handle, index: usize) -> Handle {
        let t = self.degree;
        let target = self.nodes.get(node).children[index];
        if self.nodes.get(target).keys.len() >= t {
            return target;
        }

        if index > 0 {
            let left = self.nodes.get(node).children[index - 1];
            if self.nodes.get(left).keys.len() >= t {
                self.rotate_from_left(node, index);
                return target;
            }
        }

        if index < self.nodes.get(node).keys.len() {
            let right = self.nodes.get(node).children[index + 1];
            if self.nodes.get(right).keys.len() >= t {
                self.rotate_from_right(node, index);
                return target;
            }
        }

        // No sibling can lend: merge, preferring the left sibling.
        if index > 0 {
            self.merge_children(node, index - 1)
        } else {
            self.merge_children(node, index)
        }
    }

    /// Rotates the left sibling's last key/child through the separator into
    /// the front of `children[index]`.
    fn rotate_from_left(&mut self, node: Handle, index: usize) {
        let left_handle = self.nodes.get(node).children[index - 1];
        let target_handle = self.nodes.get(node).children[index];

        let left = self.nodes.get_mut(left_handle);
        let lifted = left.keys.pop().expect("a lending sibling holds at least t keys");
        let moved_child = left.children.pop();

        let separator = core::mem::replace(&mut self.nodes.get_mut(node).keys[index - 1], lifted);

        let target = self.nodes.get_mut(target_handle);
        target.keys.insert(0, separator);
        if let Some(child) = moved_child {
            target.children.insert(0, child);
        }
    }

    /// Rotates the right sibling's first key/child through the separator onto
    /// the back of `children[index]`.
    fn rotate_from_right(&mut self, node: Handle, index: usize) {
        let right_handle = self.nodes.get(node).children[index + 1];
        let target_handle = self.nodes.get(node).children[index];

        let right = self.nodes.get_mut(right_handle);
        let lifted = right.keys.remove(0);
        let moved_child = if right.children.is_empty() {
            None
        } else {
            Some(right.children.remove(0))
        };

        let separator = core::mem::replace(&mut self.nodes.get_mut(node).keys[index], lifted);

        let target = self.nodes.get_mut(target_handle);
        target.keys.push(separator);
        if let Some(child) = moved_child {
            target.children.push(child);
        }
    }

    /// Merges `children[index + 1]` and the separator `keys[index]` into
    /// `children[index]`, freeing the right node. Collapses the root when the
    /// merge drained its last separator. Returns the merged node.
    fn merge_children(&mut self, node: Handle, index: usize) -> Handle {
        let (separator, right_handle) = {
            let parent = self.nodes.get_mut(node);
            let separator = parent.keys.remove(index);
            let right_handle = parent.children.remove(index + 1);
            (separator, right_handle)
        };
        let left_handle = self.nodes.get(node).children[index];

        let mut right = self.nodes.take(right_handle);
        let left = self.nodes.get_mut(left_handle);
        left.keys.push(separator);
        left.keys.append(&mut right.keys);
        left.children.append(&mut right.children);

        if node == self.root && self.nodes.get(node).keys.is_empty() {
            self.nodes.free(node);
            self.root = left_handle;
        }
        left_handle
    }

    fn max_key(&self, mut node: Handle) -> &K {
        loop {
            let current = self.nodes.get(node);
            match current.children.last() {
                Some(&child) => node = child,
                None => return current.keys.last().expect("non-root nodes hold at least one key"),
            }
        }
    }

    fn min_key(&self, mut node: Handle) -> &K {
        loop {
            let current = self.nodes.get(node);
            match current.children.first() {
                Some(&child) => node = child,
                None => return current.keys.first().expect("non-root nodes hold at least one key"),
            }
        }
    }
}

#[cfg(test)]
impl<K: Ord + Clone> RawBTree<K> {
    /// Panics if any structural invariant is violated. Test-only.
    pub(crate) fn validate_invariants(&self) {
        let mut leaf_depth = None;
        let mut in_order = Vec::new();
        self.validate_node(self.root, 0, &mut leaf_depth, &mut in_order);

        for window in in_order.windows(2) {
            assert!(window[0] < window[1], "in-order key sequence is not strictly sorted");
        }
    }

    /// In-order key sequence. Test-only.
    pub(crate) fn in_order_keys(&self) -> Vec<K> {
        let mut leaf_depth = None;
        let mut in_order = Vec::new();
        self.validate_node(self.root, 0, &mut leaf_depth, &mut in_order);
        in_order
    }

    fn validate_node(&self, handle: Handle, depth: usize, leaf_depth: &mut Option<usize>, in_order: &mut Vec<K>) {
        let node = self.nodes.get(handle);

        assert!(node.keys.len() <= self.max_keys(), "node exceeds 2t-1 keys");
        if handle != self.root {
            assert!(node.keys.len() >= self.degree - 1, "non-root node below t-1 keys");
        }
        for window in node.keys.windows(2) {
            assert!(window[0] < window[1], "node keys not strictly increasing");
        }

        if node.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) => assert_eq!(depth, expected, "leaves at differing depths"),
            }
            in_order.extend(node.keys.iter().cloned());
        } else {
            assert_eq!(node.children.len(), node.keys.len() + 1, "child count != key count + 1");
            for index in 0..node.children.len() {
                self.validate_node(node.children[index], depth + 1, leaf_depth, in_order);
                if index < node.keys.len() {
                    in_order.push(node.keys[index].clone());
                }
            }
        }
    }
}
