//! Mutable hash tree
//!
//! An [`OpenHashTree`] accepts mutations and defers all hashing: every write
//! records the touched path and its ancestors in a dirty set, and the hashes
//! are recomputed in one bottom-up pass when the tree is sealed with
//! [`finish`](OpenHashTree::finish). A single user operation on a deep path
//! therefore costs O(depth) bookkeeping instead of O(depth) hashing, which
//! is what makes bulk construction of million-file trees practical.
//!
//! Open trees are single-owner values; they are not internally synchronized.
//! Seal the tree and hand out the resulting [`HashTree`] to share state
//! across threads.

use crate::collections::HashSet;
use crate::error::{HashTreeError, Result};
use crate::finished::HashTree;
use crate::path::{base, clean, join, split};
use crate::query::{self, FsMap};
use crate::types::{Node, NodeBody, NodeType, ObjectRef};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

/// A mutable hash tree with deferred hashing
///
/// Created empty (holding just a root directory) via [`new`](Self::new), or
/// as a deep copy of a sealed tree via [`HashTree::open`]. Mutations keep
/// the structural invariants — parent links, sorted children, subtree sizes
/// — current at all times; only the hashes go stale, tracked by the dirty
/// set until [`finish`](Self::finish) recomputes them.
#[derive(Debug, Clone)]
pub struct OpenHashTree {
    /// Flat mapping from canonical path to node
    pub(crate) fs: FsMap,
    /// Paths whose hashes are stale
    pub(crate) dirty: HashSet<String>,
}

impl OpenHashTree {
    /// Create an empty tree containing only a root directory
    pub fn new() -> Self {
        let mut fs = FsMap::default();
        fs.insert(String::new(), Node::dir(""));
        let mut dirty = HashSet::default();
        dirty.insert(String::new());
        Self { fs, dirty }
    }

    /// Wrap an already-consistent map; used when reopening a sealed tree
    pub(crate) fn from_map(fs: FsMap) -> Self {
        Self {
            fs,
            dirty: HashSet::default(),
        }
    }

    /// Look up the node at `path`
    ///
    /// The returned node's hash may be stale; everything else is current.
    pub fn get(&self, path: &str) -> Result<&Node> {
        query::get(&self.fs, path)
    }

    /// Visit every strict ancestor of `path`, leaf to root
    ///
    /// For `"/path/to/file"` the updater runs for `("/path/to", "file")`,
    /// then `("/path", "to")`, then `("", "path")`. Before each updater call
    /// the ancestor is checked: an existing non-directory ancestor fails the
    /// whole walk with `PathConflict`, before the updater can touch state.
    /// With a no-op updater this doubles as the mutation pre-check.
    fn visit<F>(&mut self, path: &str, mut update: F) -> Result<()>
    where
        F: FnMut(&mut Self, &str, &str) -> Result<()>,
    {
        let mut cur = path.to_string();
        while !cur.is_empty() {
            let (parent, child) = split(&cur);
            if let Some(pnode) = self.fs.get(parent) {
                if !pnode.is_dir() {
                    return Err(HashTreeError::path_conflict(format!(
                        "attempted to visit \"{cur}\", but \"{parent}\" is not a directory"
                    )));
                }
            }
            let (parent, child) = (parent.to_string(), child.to_string());
            update(self, &parent, &child)?;
            cur = parent;
        }
        Ok(())
    }

    /// Append `objects` to the file at `path`, creating it if absent
    ///
    /// Missing ancestor directories are created; `size_delta` is added to
    /// the file and to every ancestor's subtree size. Fails `PathConflict`
    /// if a directory already sits at `path` or on the way to it.
    pub fn put_file(&mut self, path: &str, objects: Vec<ObjectRef>, size_delta: i64) -> Result<()> {
        self.put(path, objects, None, size_delta, None, None, 0)
    }

    /// As [`put_file`](Self::put_file), truncating the object list first
    ///
    /// With `overwrite_index` of `Some(i)`, objects from position `i`
    /// onward are discarded before the append; an index at or past the end
    /// leaves the list untouched. The caller supplies the *net* `size_delta`
    /// (new bytes minus replaced bytes).
    pub fn put_file_overwrite(
        &mut self,
        path: &str,
        objects: Vec<ObjectRef>,
        overwrite_index: Option<i64>,
        size_delta: i64,
    ) -> Result<()> {
        self.put(path, objects, overwrite_index, size_delta, None, None, 0)
    }

    /// As [`put_file`](Self::put_file), attaching header/footer blocks to
    /// the file's parent directory
    ///
    /// The parent's header and footer are overwritten unconditionally, so
    /// repeated calls against the same directory replace earlier
    /// attachments; the caller owns net `header_footer_size` accounting
    /// across such repeats. `header_footer_size` accrues to the parent and
    /// all of its ancestors so directory sizes stay consistent.
    ///
    /// With an empty `objects`, `path` itself names the directory receiving
    /// the header and footer (creating it if absent).
    pub fn put_file_split(
        &mut self,
        path: &str,
        objects: Vec<ObjectRef>,
        size: i64,
        header: Option<ObjectRef>,
        footer: Option<ObjectRef>,
        header_footer_size: i64,
    ) -> Result<()> {
        self.put(path, objects, None, size, header, footer, header_footer_size)
    }

    /// Shared implementation behind the put_file family
    #[allow(clippy::too_many_arguments)]
    fn put(
        &mut self,
        path: &str,
        objects: Vec<ObjectRef>,
        overwrite_index: Option<i64>,
        size_delta: i64,
        header: Option<ObjectRef>,
        footer: Option<ObjectRef>,
        header_footer_size: i64,
    ) -> Result<()> {
        let path = clean(path);
        trace!(path = %path, objects = objects.len(), size_delta, "put");

        // Detect path conflicts before touching any state
        self.visit(&path, |_, _, _| Ok(()))?;

        let attaching = header.is_some() || footer.is_some() || header_footer_size != 0;

        if !objects.is_empty() {
            let node = self
                .fs
                .entry(path.clone())
                .or_insert_with(|| Node::file(base(&path)));
            let file = match node.body {
                Some(NodeBody::File(ref mut file)) => file,
                _ => {
                    return Err(HashTreeError::path_conflict(format!(
                        "could not put file at \"{path}\"; a {} is already there",
                        node.node_type()
                    )))
                }
            };

            // Discard overwritten objects before appending
            if let Some(index) = overwrite_index {
                if index >= 0 && (index as usize) < file.objects.len() {
                    file.objects.truncate(index as usize);
                }
            }
            file.objects.extend(objects);
            node.subtree_size += size_delta;
            self.dirty.insert(path.clone());

            // Register the file with its parent and update sizes up to root
            let dir_of = split(&path).0.to_string();
            self.visit(&path, |t, parent, child| {
                let pnode = t
                    .fs
                    .entry(parent.to_string())
                    .or_insert_with(|| Node::dir(base(parent)));
                let dir = pnode.as_dir_mut().ok_or_else(|| {
                    HashTreeError::internal(format!("\"{parent}\" is not a directory"))
                })?;
                if attaching && parent == dir_of {
                    dir.header = header.clone();
                    dir.footer = footer.clone();
                }
                dir.insert_child(child);
                pnode.subtree_size += size_delta + header_footer_size;
                t.dirty.insert(parent.to_string());
                Ok(())
            })
        } else {
            // No objects: `path` is the directory receiving header/footer
            let node = self
                .fs
                .entry(path.clone())
                .or_insert_with(|| Node::dir(base(&path)));
            let dir = match node.body {
                Some(NodeBody::Dir(ref mut dir)) => dir,
                _ => {
                    return Err(HashTreeError::path_conflict(format!(
                        "could not put directory at \"{path}\"; a {} is already there",
                        node.node_type()
                    )))
                }
            };
            if attaching {
                dir.header = header;
                dir.footer = footer;
            }
            node.subtree_size += header_footer_size;
            self.dirty.insert(path.clone());

            self.visit(&path, |t, parent, child| {
                let pnode = t
                    .fs
                    .entry(parent.to_string())
                    .or_insert_with(|| Node::dir(base(parent)));
                let dir = pnode.as_dir_mut().ok_or_else(|| {
                    HashTreeError::internal(format!("\"{parent}\" is not a directory"))
                })?;
                dir.insert_child(child);
                pnode.subtree_size += header_footer_size;
                t.dirty.insert(parent.to_string());
                Ok(())
            })
        }
    }

    /// Create a directory at `path`, along with any missing ancestors
    ///
    /// A directory already there makes this a no-op; a file there fails
    /// `PathConflict`.
    pub fn put_dir(&mut self, path: &str) -> Result<()> {
        let path = clean(path);
        trace!(path = %path, "put_dir");

        // Detect path conflicts before touching any state
        self.visit(&path, |_, _, _| Ok(()))?;

        if let Some(node) = self.fs.get(&path) {
            match node.node_type() {
                NodeType::Directory => return Ok(()),
                NodeType::File => {
                    return Err(HashTreeError::path_conflict(format!(
                        "could not create directory at \"{path}\"; a {} is already there",
                        node.node_type()
                    )))
                }
                // An unclassified slot gets promoted to a directory
                NodeType::None => {}
            }
        }
        self.fs.insert(path.clone(), Node::dir(base(&path)));
        self.dirty.insert(path.clone());

        self.visit(&path, |t, parent, child| {
            let pnode = t
                .fs
                .entry(parent.to_string())
                .or_insert_with(|| Node::dir(base(parent)));
            let dir = pnode.as_dir_mut().ok_or_else(|| {
                HashTreeError::internal(format!("\"{parent}\" is not a directory"))
            })?;
            dir.insert_child(child);
            t.dirty.insert(parent.to_string());
            Ok(())
        })
    }

    /// Delete the file or directory at `path`, recursively
    ///
    /// The argument is matched as a glob, so a pattern deletes everything it
    /// matches; `"/"` is read as `"*"`, emptying the tree down to a bare
    /// root. Matching nothing is a no-op, not an error.
    pub fn delete_file(&mut self, path: &str) -> Result<()> {
        let path = clean(path);
        let pattern = if path.is_empty() { "*".to_string() } else { path };

        let mut matched: Vec<String> = match query::glob(&self.fs, &pattern) {
            Ok(nodes) => nodes.into_keys().collect(),
            // Deleting a non-existent file is a no-op
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e),
        };
        matched.sort_unstable();
        debug!(pattern = %pattern, matches = matched.len(), "delete");

        for path in matched {
            // A directory match may already have taken this entry with it
            let Some(node) = self.fs.get(&path) else {
                continue;
            };
            let size = node.subtree_size;

            self.remove_from_map(&path)?;

            let (parent, child) = split(&path);
            let (parent, child) = (parent.to_string(), child.to_string());
            let pnode = self.fs.get_mut(&parent).ok_or_else(|| {
                HashTreeError::internal(format!("delete discovered orphaned file \"{path}\""))
            })?;
            let dir = pnode.as_dir_mut().ok_or_else(|| {
                HashTreeError::internal(format!(
                    "file at \"{parent}\" is a regular file, but \"{path}\" exists under it"
                ))
            })?;
            if !dir.remove_child(&child) {
                return Err(HashTreeError::internal(format!(
                    "parent of \"{path}\" does not contain it"
                )));
            }

            // Subtract the removed bytes from every surviving ancestor
            self.visit(&path, |t, parent, child| {
                let pnode = t.fs.get_mut(parent).ok_or_else(|| {
                    HashTreeError::internal(format!(
                        "encountered orphaned file \"{}\" while deleting",
                        join(parent, child)
                    ))
                })?;
                pnode.subtree_size -= size;
                t.dirty.insert(parent.to_string());
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Remove the node at `path` and all of its descendants from the map
    ///
    /// Parent hashes and sizes are left for the caller to fix up once, which
    /// keeps deleting a 10k-child directory linear instead of quadratic.
    /// Dirty entries for removed paths are dropped so the dirty set only
    /// ever names live paths.
    fn remove_from_map(&mut self, path: &str) -> Result<()> {
        let children: Option<Vec<String>> = match self.fs.get(path) {
            None => return Ok(()),
            Some(node) => match &node.body {
                Some(NodeBody::File(_)) => None,
                Some(NodeBody::Dir(dir)) => Some(dir.children.clone()),
                None => {
                    return Err(HashTreeError::internal(format!(
                        "malformed file at \"{path}\": neither a regular file nor a directory"
                    )))
                }
            },
        };
        if let Some(children) = children {
            for child in &children {
                self.remove_from_map(&join(path, child))?;
            }
        }
        self.fs.remove(path);
        self.dirty.remove(path);
        Ok(())
    }

    /// Recompute the hash of the node at `path`, children first
    ///
    /// Confined to the dirty set: a clean node returns immediately, so the
    /// pass costs one hash per touched node no matter how many mutations
    /// preceded it. Children lists are maintained sorted by every mutation,
    /// which is what makes the directory hash input deterministic without a
    /// sort here.
    fn canonicalize(&mut self, path: &str) -> Result<()> {
        if !self.dirty.contains(path) {
            return Ok(());
        }

        enum Pending {
            File(Vec<u8>),
            Dir(Vec<String>),
        }

        let pending = match self.fs.get(path) {
            None => {
                return Err(HashTreeError::internal(format!(
                    "file \"{path}\" not found; cannot canonicalize"
                )))
            }
            Some(node) => match &node.body {
                Some(NodeBody::File(file)) => {
                    // File hash: the object hash strings, concatenated in order
                    let mut hasher = Sha256::new();
                    for object in &file.objects {
                        hasher.update(object.hash.as_bytes());
                    }
                    Pending::File(hasher.finalize().to_vec())
                }
                Some(NodeBody::Dir(dir)) => Pending::Dir(dir.children.clone()),
                None => {
                    return Err(HashTreeError::internal(format!(
                        "malformed file at \"{path}\" is neither a regular file nor a directory"
                    )))
                }
            },
        };

        let digest = match pending {
            Pending::File(digest) => digest,
            Pending::Dir(children) => {
                // Directory hash: `name ":" hash ":"` per child, sorted order
                let mut hasher = Sha256::new();
                for child in &children {
                    let childpath = join(path, child);
                    self.canonicalize(&childpath)?;
                    let childnode = self.fs.get(&childpath).ok_or_else(|| {
                        HashTreeError::internal(format!(
                            "could not find \"{childpath}\" while updating the hash of \"{path}\""
                        ))
                    })?;
                    hasher.update(childnode.name.as_bytes());
                    hasher.update(b":");
                    hasher.update(&childnode.hash);
                    hasher.update(b":");
                }
                hasher.finalize().to_vec()
            }
        };

        let node = self.fs.get_mut(path).ok_or_else(|| {
            HashTreeError::internal(format!("file \"{path}\" vanished while canonicalizing"))
        })?;
        node.hash = digest;
        self.dirty.remove(path);
        Ok(())
    }

    /// Seal the tree: recompute all stale hashes and return an immutable
    /// deep copy
    ///
    /// The open tree stays usable afterwards; the returned [`HashTree`]
    /// shares no state with it.
    pub fn finish(&mut self) -> Result<HashTree> {
        self.canonicalize("")?;
        let tree = HashTree::from_parts(1, self.fs.clone());
        if let Some(root) = tree.root_hash() {
            debug!(root = %hex::encode(root), "finished tree");
        }
        Ok(tree)
    }
}

impl Default for OpenHashTree {
    fn default() -> Self {
        Self::new()
    }
}
