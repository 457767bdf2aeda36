//! Substring search over the leaves of a tree

use std::{
    fmt::{self, Display},
    sync::Arc,
};

use crate::{
    tree::{LeafNode, PathTreeNode},
    types::{group_thousands, AssetRecord},
};

/// One searchable leaf with its path from the root
#[derive(Debug, Clone)]
pub struct SearchEntry<'t> {
    leaf: &'t LeafNode,
    tree_path: Vec<&'t str>,
    key: String,
    display: String,
    sort_key: String,
}

impl<'t> SearchEntry<'t> {
    fn new(leaf: &'t LeafNode, tree_path: Vec<&'t str>) -> Self {
        let record = leaf.record();
        let key = format!("{}\t{}", leaf.name(), record.guid()).to_lowercase();
        let display = format!(
            "{} ({} bytes) {{{}}}",
            record.path(),
            group_thousands(record.size().unwrap_or_default()),
            record.guid()
        );
        let sort_key = display.to_lowercase();
        Self {
            leaf,
            tree_path,
            key,
            display,
            sort_key,
        }
    }

    pub fn leaf(&self) -> &'t LeafNode {
        self.leaf
    }

    pub fn record(&self) -> &'t Arc<AssetRecord> {
        self.leaf.record()
    }

    /// Segment names from below the root down to the leaf itself
    pub fn tree_path(&self) -> &[&'t str] {
        &self.tree_path
    }

    /// `<virtual path> (<size> bytes) {<guid>}`
    pub fn display(&self) -> &str {
        &self.display
    }
}

impl Display for SearchEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Flat list of every leaf in a tree, built once and queried many times
#[derive(Debug, Clone)]
pub struct SearchIndex<'t> {
    entries: Vec<SearchEntry<'t>>,
}

impl<'t> SearchIndex<'t> {
    pub fn new(tree: &'t PathTreeNode) -> Self {
        let mut entries = Vec::new();
        collect(tree, &mut Vec::new(), &mut entries);
        Self { entries }
    }

    /// Number of searchable leaves
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Leaves whose name or GUID contains `query`, ignoring case
    ///
    /// An empty query matches nothing. Results are ordered by their display string, ignoring case.
    /// They borrow the tree, not the index.
    pub fn search(&self, query: &str) -> Vec<SearchEntry<'t>> {
        if query.is_empty() {
            return Vec::new();
        }

        let query = query.to_lowercase();
        let mut found = self
            .entries
            .iter()
            .filter(|e| e.key.contains(&query))
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by(|a, b| a.sort_key.cmp(&b.sort_key).then_with(|| a.display.cmp(&b.display)));
        found
    }
}

fn collect<'t>(node: &'t PathTreeNode, path: &mut Vec<&'t str>, entries: &mut Vec<SearchEntry<'t>>) {
    match node {
        PathTreeNode::Leaf(leaf) => {
            let mut tree_path = path.clone();
            tree_path.push(leaf.name());
            entries.push(SearchEntry::new(leaf, tree_path));
        }
        PathTreeNode::Directory(directory) => {
            if !directory.is_root() {
                path.push(directory.name());
            }
            for child in directory.children() {
                collect(child, path, entries);
            }
            if !directory.is_root() {
                path.pop();
            }
        }
    }
}
