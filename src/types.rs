//! Core data types for the tree map
//!
//! A tree is a flat mapping from canonical path to [`Node`]. Nodes come in
//! two variants — file and directory — carried by [`NodeBody`]; a node whose
//! body is absent is an unclassified slot that only exists transiently while
//! a merge is adopting types from its sources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a content block held by an external object store
///
/// The tree never dereferences these; it only folds their hash strings into
/// file hashes. Resolving an `ObjectRef` to bytes is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Hash string identifying the content block
    pub hash: String,
}

impl ObjectRef {
    /// Create an object reference from a content hash string
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }
}

/// File variant payload: the ordered sequence of content blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Object references in content order; appends go at the end
    pub objects: Vec<ObjectRef>,
}

/// Directory variant payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirNode {
    /// Children basenames, strictly ascending, no duplicates
    pub children: Vec<String>,
    /// Optional header block prepended to the directory's content
    pub header: Option<ObjectRef>,
    /// Optional footer block appended to the directory's content
    pub footer: Option<ObjectRef>,
}

impl DirNode {
    /// Insert a child basename, keeping the list sorted
    ///
    /// Re-inserting a name that is already present is a no-op, so callers
    /// can register a child unconditionally on every write to it.
    pub fn insert_child(&mut self, name: &str) {
        if let Err(pos) = self.children.binary_search_by(|c| c.as_str().cmp(name)) {
            self.children.insert(pos, name.to_string());
        }
    }

    /// Remove a child basename, reporting whether it was present
    pub fn remove_child(&mut self, name: &str) -> bool {
        match self.children.binary_search_by(|c| c.as_str().cmp(name)) {
            Ok(pos) => {
                self.children.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Whether `name` is a child of this directory
    pub fn has_child(&self, name: &str) -> bool {
        self.children
            .binary_search_by(|c| c.as_str().cmp(name))
            .is_ok()
    }
}

/// The file-or-directory payload of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeBody {
    /// Regular file
    File(FileNode),
    /// Directory
    Dir(DirNode),
}

/// A single entry in the flat tree map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Basename of this node; empty string for the root
    pub name: String,
    /// 32-byte SHA-256 digest; only current after canonicalization
    pub hash: Vec<u8>,
    /// Total byte count of this node's subtree (the file size for files),
    /// including any header/footer bytes attached to directories
    pub subtree_size: i64,
    /// File or directory payload; `None` only while a merge is still
    /// adopting the node's type from its sources
    pub body: Option<NodeBody>,
}

impl Node {
    /// Create an empty file node
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: Vec::new(),
            subtree_size: 0,
            body: Some(NodeBody::File(FileNode::default())),
        }
    }

    /// Create an empty directory node
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: Vec::new(),
            subtree_size: 0,
            body: Some(NodeBody::Dir(DirNode::default())),
        }
    }

    /// Create an unclassified slot, typed later by merge
    pub(crate) fn slot(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: Vec::new(),
            subtree_size: 0,
            body: None,
        }
    }

    /// The type of this node, for dispatch and conflict messages
    pub fn node_type(&self) -> NodeType {
        match self.body {
            None => NodeType::None,
            Some(NodeBody::File(_)) => NodeType::File,
            Some(NodeBody::Dir(_)) => NodeType::Directory,
        }
    }

    /// Whether this node is a directory
    pub fn is_dir(&self) -> bool {
        matches!(self.body, Some(NodeBody::Dir(_)))
    }

    /// Whether this node is a regular file
    pub fn is_file(&self) -> bool {
        matches!(self.body, Some(NodeBody::File(_)))
    }

    /// The directory payload, if this node is a directory
    pub fn as_dir(&self) -> Option<&DirNode> {
        match &self.body {
            Some(NodeBody::Dir(d)) => Some(d),
            _ => None,
        }
    }

    /// Mutable directory payload, if this node is a directory
    pub(crate) fn as_dir_mut(&mut self) -> Option<&mut DirNode> {
        match &mut self.body {
            Some(NodeBody::Dir(d)) => Some(d),
            _ => None,
        }
    }

    /// The file payload, if this node is a regular file
    pub fn as_file(&self) -> Option<&FileNode> {
        match &self.body {
            Some(NodeBody::File(f)) => Some(f),
            _ => None,
        }
    }

    /// Mutable file payload, if this node is a regular file
    pub(crate) fn as_file_mut(&mut self) -> Option<&mut FileNode> {
        match &mut self.body {
            Some(NodeBody::File(f)) => Some(f),
            _ => None,
        }
    }
}

/// Classification of a node (or of the absence of one)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// No payload yet; an unclassified merge slot
    None,
    /// Regular file
    File,
    /// Directory
    Directory,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::None => write!(f, "none"),
            NodeType::File => write!(f, "file"),
            NodeType::Directory => write!(f, "directory"),
        }
    }
}
