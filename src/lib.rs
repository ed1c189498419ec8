//! # Hashtree - Content-addressed commit snapshots
//!
//! A content-addressed hierarchical hash tree representing the full
//! filesystem state of a single immutable commit in a versioned data
//! repository.
//!
//! ## Overview
//!
//! Every directory node's SHA-256 hash is derived from the names and hashes
//! of its children, and every file node's hash is derived from the
//! identifiers of its underlying content blocks. That gives the tree the
//! Merkle property: two trees are structurally identical exactly when their
//! root hashes match, which enables:
//!
//! - Cheap equality checks between whole commits
//! - Efficient diffing that skips identical subtrees wholesale
//! - Deterministic merging of independently produced subtrees
//!
//! The tree itself stores no file content. File nodes hold ordered
//! [`ObjectRef`]s — opaque identifiers into an external object store — and
//! resolving those to bytes is the caller's concern.
//!
//! ## Quick Start
//!
//! ```rust
//! use hashtree::{HashTree, ObjectRef, OpenHashTree};
//!
//! # fn main() -> hashtree::Result<()> {
//! // Build a tree by mutation
//! let mut open = OpenHashTree::new();
//! open.put_file("/src/main.rs", vec![ObjectRef::new("block-1")], 1024)?;
//! open.put_file("/README.md", vec![ObjectRef::new("block-2")], 512)?;
//!
//! // Seal it; hashing happens once, bottom-up
//! let tree = open.finish()?;
//! assert_eq!(tree.fs_size(), 1536);
//!
//! // Sealed trees are immutable, hashable, and serializable
//! let bytes = tree.serialize()?;
//! let restored = HashTree::deserialize(&bytes)?;
//! assert_eq!(tree.root_hash(), restored.root_hash());
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Concepts
//!
//! ### Open vs finished trees
//!
//! An [`OpenHashTree`] accepts mutations (`put_file`, `put_dir`,
//! `delete_file`, `merge`) and tracks which paths have stale hashes in a
//! dirty set; hashing is deferred entirely until
//! [`finish`](OpenHashTree::finish) seals the tree into an immutable
//! [`HashTree`]. Sealing a tree after a million inserts costs one hash per
//! touched node, not one per insert. A finished tree can be
//! [`open`](HashTree::open)ed again, producing an independent mutable deep
//! copy.
//!
//! ### Canonical paths
//!
//! Paths are absolute, `/`-delimited strings. Callers write `"/a/b"`;
//! internally the root is the empty string and every operation cleans its
//! input (`.`, `..`, duplicate and trailing slashes) first.
//!
//! ### Merging
//!
//! [`merge`](OpenHashTree::merge) combines any number of finished trees
//! into an open tree in one pass. Directory levels group their children by
//! name before recursing, so merging thousands of sibling-sharded trees
//! stays linear in the number of distinct (tree, path) pairs instead of
//! going quadratic in the source count.
//!
//! ### Glob, walk, diff
//!
//! Finished trees expose the flat namespace directly:
//! [`glob`](HashTree::glob) matches shell-style patterns against canonical
//! paths, [`walk`](HashTree::walk) visits subtrees, and
//! [`diff`](HashTree::diff) compares two trees to bounded or unbounded
//! depth, skipping hash-identical subtrees.
//!
//! ## Concurrency
//!
//! Open trees are single-owner values with no internal synchronization:
//! funnel mutations through one owner, then hand the sealed [`HashTree`]
//! out for shared reading. All operations are synchronous and CPU-bound;
//! the library performs no I/O.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`](Result) with [`HashTreeError`]
//! carrying a public kind ([`ErrorKind`](error::ErrorKind)) and a message.
//! `PathNotFound` and `PathConflict` are the recoverable workhorses;
//! `Internal` signals an invariant violation, after which the tree should
//! be discarded.

// Public API modules
pub mod error;
pub mod finished;
pub mod open;
pub mod path;
pub mod types;

// Internal modules (not part of public API)
mod collections;
mod merge;
mod query;

// Re-export main types for convenience
pub use error::{ErrorKind, HashTreeError, Result};
pub use finished::HashTree;
pub use open::OpenHashTree;
pub use types::{DirNode, FileNode, Node, NodeBody, NodeType, ObjectRef};
