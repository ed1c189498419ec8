//! Error types for the hashtree library
//!
//! Every fallible operation returns [`Result<T>`]. The error enum carries one
//! variant per public error kind; the kind is the discriminator callers match
//! on to recover, and the payload is a human-readable description of what
//! went wrong.

use thiserror::Error;

/// Type alias for Results in the hashtree library
pub type Result<T> = std::result::Result<T, HashTreeError>;

/// Main error type for all hashtree operations
#[derive(Debug, Error)]
pub enum HashTreeError {
    /// Lookup of a path that is not present in the tree
    #[error("file \"{0}\" not found")]
    PathNotFound(String),

    /// Type mismatch between an operation and the node present (file vs
    /// directory), or inconsistent types across merged trees
    #[error("path conflict: {0}")]
    PathConflict(String),

    /// Glob pattern failed to compile
    #[error("malformed glob: {0}")]
    MalformedGlob(String),

    /// Serialized tree carries a version this library does not recognize
    #[error("unsupported hash tree version {0}")]
    Unsupported(i64),

    /// Errors during bincode encoding/decoding of the envelope
    #[error("bincode error: {0}")]
    Codec(String),

    /// Invariant violation; the tree is in an undefined state and should be
    /// discarded
    #[error("internal error: {0}")]
    Internal(String),
}

// bincode 2.0 splits its error type in two; both collapse into Codec
impl From<bincode::error::DecodeError> for HashTreeError {
    fn from(err: bincode::error::DecodeError) -> Self {
        HashTreeError::Codec(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for HashTreeError {
    fn from(err: bincode::error::EncodeError) -> Self {
        HashTreeError::Codec(err.to_string())
    }
}

/// Public error kind, the discriminator callers use to recover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`HashTreeError::PathNotFound`]
    PathNotFound,
    /// See [`HashTreeError::PathConflict`]
    PathConflict,
    /// See [`HashTreeError::MalformedGlob`]
    MalformedGlob,
    /// See [`HashTreeError::Unsupported`]
    Unsupported,
    /// See [`HashTreeError::Internal`]
    Internal,
}

impl HashTreeError {
    /// Create a path-not-found error for `path`
    pub fn path_not_found(path: impl Into<String>) -> Self {
        HashTreeError::PathNotFound(path.into())
    }

    /// Create a path-conflict error with a custom message
    pub fn path_conflict(msg: impl Into<String>) -> Self {
        HashTreeError::PathConflict(msg.into())
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        HashTreeError::Internal(msg.into())
    }

    /// The public kind of this error
    ///
    /// Codec failures surface as [`ErrorKind::Internal`]: a tree that fails
    /// to encode or decode is corrupt from the caller's point of view.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HashTreeError::PathNotFound(_) => ErrorKind::PathNotFound,
            HashTreeError::PathConflict(_) => ErrorKind::PathConflict,
            HashTreeError::MalformedGlob(_) => ErrorKind::MalformedGlob,
            HashTreeError::Unsupported(_) => ErrorKind::Unsupported,
            HashTreeError::Codec(_) | HashTreeError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error is a path-not-found
    ///
    /// Several operations treat missing paths as "nothing to do" rather than
    /// failure (deletion, merge sources), so this predicate shows up on most
    /// recovery paths.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HashTreeError::PathNotFound(_))
    }
}
