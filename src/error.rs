//! Error types for tree resolution and traversal.
//!
//! `TreeError` covers every failure a walk can report back to its caller.
//! Failures while crossing into a submodule are different: they are wrapped
//! in `TreeError::Fatal` and the top-level consumer must terminate the
//! process when it sees one (see `TreeError::is_fatal`).
//!
//! Recoverable:
//! - `DepthExceeded`, `MissingObject`, `WrongType`, `CorruptTree`,
//!   `VisitorAborted`, `Git`, `RepoNotFound`, `InvalidPathspec`,
//!   `Internal`
//!
//! Fatal:
//! - `SubmoduleInit`, `IndexCorrupt`, `CommitNotFound`, `InvalidCommit`,
//!   `SubtreeFailed`

use git2::{ObjectType, Oid};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("exceeded maximum allowed tree depth ({depth} > {max})")]
    DepthExceeded { depth: usize, max: usize },

    #[error("Could not read {0}")]
    MissingObject(Oid),

    #[error("Object {oid} not a {expected}")]
    WrongType {
        oid: Oid,
        expected: ObjectType,
        actual: Option<ObjectType>,
    },

    #[error("corrupt tree {oid}: {reason}")]
    CorruptTree { oid: Oid, reason: String },

    #[error("visitor aborted traversal")]
    VisitorAborted(#[source] anyhow::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Invalid pathspec: {0}")]
    InvalidPathspec(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

/// Unrecoverable failures raised while crossing a submodule boundary.
#[derive(Error, Debug)]
pub enum FatalError {
    #[error("couldn't init submodule {path}")]
    SubmoduleInit {
        path: String,
        #[source]
        source: Box<TreeError>,
    },

    #[error("index file corrupt")]
    IndexCorrupt(#[source] Box<TreeError>),

    #[error("Commit {oid} in submodule path {path} not found")]
    CommitNotFound { oid: Oid, path: String },

    #[error("Invalid commit {oid} in submodule path {path}")]
    InvalidCommit {
        oid: Oid,
        path: String,
        #[source]
        source: Box<TreeError>,
    },

    #[error("failed to read tree for {path}")]
    SubtreeFailed {
        path: String,
        #[source]
        source: Box<TreeError>,
    },
}

impl TreeError {
    /// True when the error must end the process instead of being handled.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TreeError::Fatal(_))
    }
}

pub type Result<T> = std::result::Result<T, TreeError>;
