//! Object store interface and the commit handle used while crossing into
//! submodules.

use git2::{ObjectType, Oid};

use crate::error::Result;

/// An object as stored: declared kind plus its uncompressed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    pub kind: ObjectType,
    pub data: Vec<u8>,
}

/// A staged path from the persisted index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub path: Vec<u8>,
    pub mode: u32,
    pub oid: Oid,
}

/// The persisted index of a repository, as loaded for pathspec matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexState {
    pub entries: Vec<IndexEntry>,
}

/// Backing storage of one repository.
///
/// `read_object` returns `Ok(None)` for an identity the store does not have;
/// `Err` is reserved for the store itself failing.
pub trait ObjectStore {
    fn read_object(&self, oid: Oid) -> Result<Option<RawObject>>;

    fn contains(&self, oid: Oid) -> Result<bool> {
        Ok(self.read_object(oid)?.is_some())
    }

    /// Follow tags and commits from `oid` down to a tree and return its id.
    fn peel_to_tree(&self, oid: Oid) -> Result<Oid>;

    /// Tree recorded by the commit `oid`, `None` when it records the null id.
    fn commit_tree_id(&self, oid: Oid) -> Result<Option<Oid>>;

    fn read_index(&self) -> Result<IndexState>;

    /// Open the repository checked out at `path`, relative to this
    /// repository's top level.
    fn open_submodule(&self, path: &str) -> Result<Box<dyn ObjectStore>>;

    /// Store-level override of the maximum tree depth, if configured.
    fn max_tree_depth(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitState {
    Unparsed,
    Parsed { tree: Option<Oid> },
}

/// A commit handle inside one repository context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    oid: Oid,
    state: CommitState,
}

impl Commit {
    pub(crate) fn new(oid: Oid) -> Self {
        Self {
            oid,
            state: CommitState::Unparsed,
        }
    }

    pub fn id(&self) -> Oid {
        self.oid
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self.state, CommitState::Parsed { .. })
    }

    /// Tree recorded in the commit; `None` until parsed or when the commit
    /// points at the null tree.
    pub fn tree_id(&self) -> Option<Oid> {
        match self.state {
            CommitState::Unparsed => None,
            CommitState::Parsed { tree } => tree,
        }
    }

    pub(crate) fn set_parsed(&mut self, tree: Option<Oid>) {
        self.state = CommitState::Parsed { tree };
    }
}
