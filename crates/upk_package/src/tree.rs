//! Hierarchy reconstructed from the virtual paths of a package.

use indexmap::{map::Entry, IndexMap};
use std::{
    cmp::Ordering,
    fmt::{self, Display},
    sync::Arc,
};
use tracing::{instrument, trace};

use crate::{
    error::{Collision, FormatError, Result},
    types::{group_thousands, AssetRecord},
};

/// A node of the reconstructed tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathTreeNode {
    Directory(DirectoryNode),
    Leaf(LeafNode),
}

/// A directory, either backed by a directory record or implied by its descendants
#[derive(Debug, Clone)]
pub struct DirectoryNode {
    name: String,
    record: Option<Arc<AssetRecord>>,
    children: IndexMap<String, PathTreeNode>,
}

/// A file record placed at the last segment of its virtual path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    name: String,
    record: Arc<AssetRecord>,
}

impl PartialEq for DirectoryNode {
    fn eq(&self, other: &Self) -> bool {
        // child order is part of the tree
        self.name == other.name
            && self.record == other.record
            && self.children.iter().eq(other.children.iter())
    }
}

impl Eq for DirectoryNode {}

impl DirectoryNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            record: None,
            children: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The directory record whose virtual path is this directory, if the package has one
    pub fn record(&self) -> Option<&Arc<AssetRecord>> {
        self.record.as_ref()
    }

    /// Whether this directory only exists because something below it does
    pub fn is_implied(&self) -> bool {
        self.record.is_none()
    }

    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    /// Children in display order, directories first
    pub fn children(&self) -> impl ExactSizeIterator<Item = &PathTreeNode> {
        self.children.values()
    }

    pub fn child(&self, name: &str) -> Option<&PathTreeNode> {
        self.children.get(name)
    }

    /// Walk down `segments`, creating implied directories on the way
    fn directory_mut<'s>(&mut self, segments: impl IntoIterator<Item = &'s str>) -> Result<&mut DirectoryNode> {
        let mut current = self;
        let mut path = String::new();
        for segment in segments {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(segment);

            let child = current
                .children
                .entry(segment.to_owned())
                .or_insert_with(|| PathTreeNode::Directory(DirectoryNode::new(segment)));
            current = match child {
                PathTreeNode::Directory(directory) => directory,
                PathTreeNode::Leaf(_) => {
                    return Err(FormatError::PathCollision {
                        path,
                        kind: Collision::FileAndDirectory,
                    }
                    .into())
                }
            };
        }
        Ok(current)
    }

    fn sort_recursive(&mut self) {
        self.children.sort_by(|_, a, _, b| display_order(a, b));
        for child in self.children.values_mut() {
            if let PathTreeNode::Directory(directory) = child {
                directory.sort_recursive();
            }
        }
    }
}

impl LeafNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record(&self) -> &Arc<AssetRecord> {
        &self.record
    }
}

impl PathTreeNode {
    /// Last segment of the node's path, empty for the root
    pub fn name(&self) -> &str {
        match self {
            PathTreeNode::Directory(directory) => directory.name(),
            PathTreeNode::Leaf(leaf) => leaf.name(),
        }
    }

    pub fn record(&self) -> Option<&Arc<AssetRecord>> {
        match self {
            PathTreeNode::Directory(directory) => directory.record(),
            PathTreeNode::Leaf(leaf) => Some(leaf.record()),
        }
    }

    pub fn guid(&self) -> Option<&str> {
        self.record().map(|r| r.guid())
    }

    pub fn is_root(&self) -> bool {
        matches!(self, PathTreeNode::Directory(directory) if directory.is_root())
    }

    pub fn is_implied(&self) -> bool {
        matches!(self, PathTreeNode::Directory(directory) if directory.is_implied())
    }

    /// Children in display order. Leaves have none.
    pub fn children(&self) -> impl Iterator<Item = &PathTreeNode> {
        self.as_directory().into_iter().flat_map(|d| d.children())
    }

    pub fn child(&self, name: &str) -> Option<&PathTreeNode> {
        self.as_directory().and_then(|d| d.child(name))
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            PathTreeNode::Directory(directory) => Some(directory),
            PathTreeNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            PathTreeNode::Directory(_) => None,
            PathTreeNode::Leaf(leaf) => Some(leaf),
        }
    }
}

impl Display for PathTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathTreeNode::Directory(directory) if directory.is_root() => f.write_str("<root>"),
            PathTreeNode::Directory(directory) => match directory.record() {
                Some(record) => write!(f, "{} {{{}}}", directory.name, record.guid()),
                None => write!(f, "{} {{missing directory .meta}}", directory.name),
            },
            PathTreeNode::Leaf(leaf) => {
                let record = &leaf.record;
                write!(
                    f,
                    "{} ({} bytes) {{{}}}",
                    leaf.name,
                    group_thousands(record.size().unwrap_or_default()),
                    record.guid()
                )?;
                if let Some(modified) = record.modified() {
                    write!(f, " {}", modified.format("%m/%d/%y"))?;
                }
                Ok(())
            }
        }
    }
}

/// Directories before leaves, then case-insensitive by name. Leaves break ties on GUID.
fn display_order(a: &PathTreeNode, b: &PathTreeNode) -> Ordering {
    match (a, b) {
        (PathTreeNode::Directory(a), PathTreeNode::Directory(b)) => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
        (PathTreeNode::Directory(_), PathTreeNode::Leaf(_)) => Ordering::Less,
        (PathTreeNode::Leaf(_), PathTreeNode::Directory(_)) => Ordering::Greater,
        (PathTreeNode::Leaf(a), PathTreeNode::Leaf(b)) => {
            let key = |leaf: &LeafNode| (leaf.name.to_lowercase(), leaf.record.guid().to_lowercase());
            key(a).cmp(&key(b)).then_with(|| a.name.cmp(&b.name))
        }
    }
}

/// Build the tree implied by the virtual paths of `records`
///
/// Directory records are placed first so they claim their node no matter where their files are. The
/// result only depends on the set of records, not their order.
#[instrument(skip_all, fields(records = records.len()), err)]
pub fn build_tree(records: &[Arc<AssetRecord>]) -> Result<PathTreeNode> {
    let (mut directories, mut files): (Vec<_>, Vec<_>) = records.iter().partition(|r| r.is_directory());
    let by_path = |a: &&Arc<AssetRecord>, b: &&Arc<AssetRecord>| {
        a.path().cmp(b.path()).then_with(|| a.guid().cmp(b.guid()))
    };
    directories.sort_by(by_path);
    files.sort_by(by_path);

    let mut root = DirectoryNode::new("");

    for record in directories {
        let directory = root.directory_mut(record.segments())?;
        if directory.record.is_some() || directory.is_root() {
            return Err(FormatError::PathCollision {
                path: record.path().to_owned(),
                kind: Collision::Directories,
            }
            .into());
        }
        trace!("directory {} at {}", record.guid(), record.path());
        directory.record = Some(Arc::clone(record));
    }

    for record in files {
        let segments = record.segments().collect::<Vec<_>>();
        let Some((name, parents)) = segments.split_last() else {
            return Err(FormatError::PathCollision {
                path: record.path().to_owned(),
                kind: Collision::FileAndDirectory,
            }
            .into());
        };

        let parent = root.directory_mut(parents.iter().copied())?;
        match parent.children.entry((*name).to_owned()) {
            Entry::Occupied(occupied) => {
                let kind = match occupied.get() {
                    PathTreeNode::Leaf(_) => Collision::Files,
                    PathTreeNode::Directory(_) => Collision::FileAndDirectory,
                };
                return Err(FormatError::PathCollision {
                    path: record.path().to_owned(),
                    kind,
                }
                .into());
            }
            Entry::Vacant(slot) => {
                slot.insert(PathTreeNode::Leaf(LeafNode {
                    name: (*name).to_owned(),
                    record: Arc::clone(record),
                }));
            }
        }
    }

    root.sort_recursive();
    Ok(PathTreeNode::Directory(root))
}
