//! Merge engine
//!
//! Combines N sealed trees into an open tree in a single recursive pass.
//! The interesting case is wide fan-in: thousands of sibling trees each
//! contributing one unique child to a shared output directory. A naive
//! merge would re-scan every source at every child, going quadratic in the
//! source count; instead each directory level builds a reverse index from
//! child basename to the sources that actually contain it, and recurses
//! once per distinct child with only those sources. Total work stays linear
//! in the number of distinct (tree, path) pairs.

use crate::collections::HashMap;
use crate::error::{HashTreeError, Result};
use crate::finished::HashTree;
use crate::open::OpenHashTree;
use crate::path::{base, join};
use crate::types::{DirNode, FileNode, Node, NodeBody, NodeType};
use tracing::debug;

impl OpenHashTree {
    /// Merge the sealed `trees` into this tree
    ///
    /// Sources contribute in the order given: merged file nodes carry the
    /// concatenation of every source's objects, first tree first. A path
    /// that is a file in one source and a directory in another (or in the
    /// destination) fails `PathConflict`. Empty trees are skipped.
    ///
    /// Hashes are not recomputed here; call
    /// [`finish`](OpenHashTree::finish) to seal the result.
    pub fn merge(&mut self, trees: &[HashTree]) -> Result<()> {
        // An empty tree has no root entry and contributes nothing
        let sources: Vec<&HashTree> = trees.iter().filter(|t| t.get("/").is_ok()).collect();
        debug!(sources = sources.len(), skipped = trees.len() - sources.len(), "merge");
        if sources.is_empty() {
            return Ok(());
        }
        self.merge_node("", &sources)?;
        Ok(())
    }

    /// Merge the node at canonical `path` from `sources`, returning the
    /// total bytes added under it
    fn merge_node(&mut self, path: &str, sources: &[&HashTree]) -> Result<i64> {
        // The destination starts as an unclassified slot and adopts the
        // type of the first source that has this path
        let mut dest_type = match self.fs.get(path) {
            Some(node) => node.node_type(),
            None => {
                self.fs.insert(path.to_string(), Node::slot(base(path)));
                NodeType::None
            }
        };

        // Bytes added under `path`, returned to the caller for propagation
        let mut size_delta: i64 = 0;

        // Reverse index from child basename to the sources containing it,
        // so each child is merged once, seeing only its own sources
        let mut children_to_trees: HashMap<String, Vec<&HashTree>> = HashMap::default();

        for src in sources {
            let node = match src.get(path) {
                Ok(node) => node,
                // This source does not contribute at this path
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };

            let src_type = node.node_type();
            if dest_type == NodeType::None {
                let dest = self.fs.get_mut(path).ok_or_else(|| {
                    HashTreeError::internal(format!("destination \"{path}\" vanished during merge"))
                })?;
                match src_type {
                    NodeType::Directory => dest.body = Some(NodeBody::Dir(DirNode::default())),
                    NodeType::File => dest.body = Some(NodeBody::File(FileNode::default())),
                    NodeType::None => {
                        return Err(HashTreeError::internal(format!(
                            "malformed file at \"{path}\" in a source tree is neither a \
                             regular file nor a directory"
                        )))
                    }
                }
                dest_type = src_type;
            } else if dest_type != src_type {
                return Err(HashTreeError::path_conflict(format!(
                    "could not merge path \"{path}\", which is a regular file in some \
                     trees and a directory in others"
                )));
            }

            match &node.body {
                Some(NodeBody::Dir(dir)) => {
                    for child in &dir.children {
                        children_to_trees
                            .entry(child.clone())
                            .or_default()
                            .push(*src);
                    }
                }
                Some(NodeBody::File(file)) => {
                    // Object appends happen here; size updates here too,
                    // since canonicalization recomputes hashes but not sizes
                    let objects = file.objects.clone();
                    let src_size = node.subtree_size;
                    let dest = self.fs.get_mut(path).ok_or_else(|| {
                        HashTreeError::internal(format!(
                            "destination \"{path}\" vanished during merge"
                        ))
                    })?;
                    let dest_file = dest.as_file_mut().ok_or_else(|| {
                        HashTreeError::internal(format!(
                            "destination \"{path}\" lost its file body during merge"
                        ))
                    })?;
                    dest_file.objects.extend(objects);
                    size_delta += src_size;
                }
                None => {
                    return Err(HashTreeError::internal(format!(
                        "malformed file at \"{path}\" in a source tree is neither a \
                         regular file nor a directory"
                    )))
                }
            }
        }

        // Directories recurse once per distinct child, then register it
        if dest_type == NodeType::Directory {
            for (child, child_sources) in children_to_trees {
                let child_delta = self.merge_node(&join(path, &child), &child_sources)?;
                size_delta += child_delta;
                let dest = self.fs.get_mut(path).ok_or_else(|| {
                    HashTreeError::internal(format!("destination \"{path}\" vanished during merge"))
                })?;
                let dir = dest.as_dir_mut().ok_or_else(|| {
                    HashTreeError::internal(format!(
                        "destination \"{path}\" lost its directory body during merge"
                    ))
                })?;
                dir.insert_child(&child);
            }
        }

        let dest = self.fs.get_mut(path).ok_or_else(|| {
            HashTreeError::internal(format!("destination \"{path}\" vanished during merge"))
        })?;
        dest.subtree_size += size_delta;
        self.dirty.insert(path.to_string());
        Ok(size_delta)
    }
}
