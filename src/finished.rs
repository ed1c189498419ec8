//! Immutable, fully hashed trees
//!
//! A [`HashTree`] is the sealed form produced by
//! [`OpenHashTree::finish`]: every hash is current, nothing mutates, and
//! the value is safe to share for reading across threads. Two trees are
//! structurally identical exactly when their root hashes match, which is
//! what makes equality checks and diffing cheap.

use crate::collections::{HashMap, HashSet};
use crate::error::{HashTreeError, Result};
use crate::open::OpenHashTree;
use crate::path::{clean, join};
use crate::query::{self, FsMap};
use crate::types::Node;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// An immutable hash tree describing the state of a single commit
///
/// Obtained by sealing an [`OpenHashTree`] or by
/// [`deserialize`](Self::deserialize)-ing stored bytes. Serialized trees
/// are a versioned envelope over the flat path map; only version 1 is
/// recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashTree {
    /// Envelope version; always 1 for trees produced by this library
    version: i64,
    /// Flat mapping from canonical path to node
    fs: FsMap,
}

impl HashTree {
    /// Assemble a sealed tree from its parts
    pub(crate) fn from_parts(version: i64, fs: FsMap) -> Self {
        Self { version, fs }
    }

    /// The envelope version of this tree
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Look up the node at `path`
    ///
    /// `"/"` (and any spelling that cleans to it) returns the root
    /// directory node.
    pub fn get(&self, path: &str) -> Result<&Node> {
        query::get(&self.fs, path)
    }

    /// The children of the directory at `path`, in sorted child order
    ///
    /// Fails `PathNotFound` if nothing is there and `PathConflict` if a
    /// regular file is.
    pub fn list(&self, path: &str) -> Result<Vec<&Node>> {
        query::list(&self.fs, path)
    }

    /// All (path, node) pairs whose canonical path matches `pattern`
    ///
    /// A pattern without glob metacharacters (`* ? [ ] { } !`) is an exact
    /// lookup; one that fails to compile is `MalformedGlob`. Keys are
    /// canonical paths, so a pattern resolving to the root yields the key
    /// `""`.
    pub fn glob(&self, pattern: &str) -> Result<HashMap<String, &Node>> {
        query::glob(&self.fs, pattern)
    }

    /// Visit `path` and everything under it
    ///
    /// Visit order is unspecified; callers that need sorted traversal must
    /// collect and sort. The root is presented as `"/"`. A visitor error
    /// stops the walk and propagates.
    pub fn walk<F>(&self, path: &str, mut visitor: F) -> Result<()>
    where
        F: FnMut(&str, &Node) -> Result<()>,
    {
        query::walk(&self.fs, path, &mut visitor)
    }

    /// Total byte count of the tree; zero for an empty tree
    pub fn fs_size(&self) -> i64 {
        query::fs_size(&self.fs)
    }

    /// The root directory's hash, if the tree has a root
    pub fn root_hash(&self) -> Option<&[u8]> {
        self.fs.get("").map(|root| root.hash.as_slice())
    }

    /// Recursively compare the subtree at `new_path` in `self` with the
    /// subtree at `old_path` in `old`
    ///
    /// Subtrees with equal hashes are skipped wholesale. Where they differ,
    /// the visitor receives file nodes (and, at the depth cutoff, directory
    /// nodes) with `added = true` for `self`'s side and `added = false` for
    /// `old`'s. `depth` bounds the recursion below the starting points;
    /// `-1` means unbounded. Either path may be absent from its tree.
    pub fn diff<F>(
        &self,
        old: &HashTree,
        new_path: &str,
        old_path: &str,
        depth: i64,
        visitor: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&str, &Node, bool) -> Result<()>,
    {
        self.diff_at(old, &clean(new_path), &clean(old_path), depth, visitor)
    }

    fn diff_at<F>(
        &self,
        old: &HashTree,
        new_path: &str,
        old_path: &str,
        depth: i64,
        visitor: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&str, &Node, bool) -> Result<()>,
    {
        let new_node = self.fs.get(new_path);
        let old_node = old.fs.get(old_path);

        match (new_node, old_node) {
            (None, None) => return Ok(()),
            (Some(a), Some(b)) if a.hash == b.hash => return Ok(()),
            _ => {}
        }

        // Union of both sides' children; sides that bottom out (files, or
        // any node at the depth cutoff) go to the visitor instead
        let mut children: HashSet<&str> = HashSet::default();
        if let Some(node) = new_node {
            if node.is_file() || depth == 0 {
                visitor(display_path(new_path), node, true)?;
            } else if let Some(dir) = node.as_dir() {
                children.extend(dir.children.iter().map(|c| c.as_str()));
            }
        }
        if let Some(node) = old_node {
            if node.is_file() || depth == 0 {
                visitor(display_path(old_path), node, false)?;
            } else if let Some(dir) = node.as_dir() {
                children.extend(dir.children.iter().map(|c| c.as_str()));
            }
        }

        if depth > 0 || depth == -1 {
            let next = if depth > 0 { depth - 1 } else { depth };
            for child in children {
                self.diff_at(
                    old,
                    &join(new_path, child),
                    &join(old_path, child),
                    next,
                    visitor,
                )?;
            }
        }
        Ok(())
    }

    /// Reopen this tree for mutation
    ///
    /// Returns a deep copy; the sealed tree is unaffected by anything done
    /// to the copy.
    pub fn open(&self) -> OpenHashTree {
        OpenHashTree::from_map(self.fs.clone())
    }

    /// Encode this tree into its persisted envelope
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())?;
        trace!(bytes = bytes.len(), nodes = self.fs.len(), "serialized tree");
        Ok(bytes)
    }

    /// Decode a tree from its persisted envelope
    ///
    /// Fails `Unsupported` if the envelope carries any version other
    /// than 1.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let (tree, _): (HashTree, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        if tree.version != 1 {
            return Err(HashTreeError::Unsupported(tree.version));
        }
        Ok(tree)
    }
}

/// Canonical paths print the root as `"/"`
fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}
