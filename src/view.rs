/// A structural snapshot of a tree, one view node per tree node.
///
/// The label joins the node's entries with `", "`; each entry renders as
/// `key=value` when the value is known and as the bare key otherwise (B-tree
/// internals carry keys only). Children appear left to right. An empty map
/// exports a single view node with an empty label.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TreeView {
    pub label: String,
    pub children: Vec<TreeView>,
}

impl TreeView {
    pub(crate) fn new(label: String, children: Vec<TreeView>) -> Self {
        Self { label, children }
    }

    /// Depth of the tree under this node, counting this node.
    pub fn height(&self) -> usize {
        1 + self.children.iter().map(TreeView::height).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_counts_the_longest_path() {
        let leaf = TreeView::new("3".into(), Vec::new());
        let mid = TreeView::new("2".into(), vec![leaf]);
        let root = TreeView::new("1".into(), vec![TreeView::default(), mid]);
        assert_eq!(root.height(), 3);
    }
}
