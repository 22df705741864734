//! Git object access and tree traversal.
//!
//! - `repository`: git2-backed `ObjectStore`
//! - `memory`: in-memory `ObjectStore`
//! - `context`: per-repository walk state, tree cache, submodule contexts
//! - `tree`: lazily parsed tree objects and entry decoding
//! - `walk`: `read_tree_at`, the pathspec-filtered recursive walk
//! - `submodule`: crossing gitlinks into submodule repositories
//! - `pathspec`: interest classification
//! - `compare`: tree entry name ordering
//! - `listing`: collecting visitor used by the CLI

pub mod compare;
pub mod context;
pub mod listing;
pub mod memory;
pub mod mode;
pub mod object;
pub mod pathspec;
pub mod repository;
mod submodule;
pub mod tree;
pub mod walk;

pub use compare::{base_name_compare, df_name_compare, name_compare};
pub use context::{DEFAULT_MAX_TREE_DEPTH, DepthMode, RepoContext, WalkOptions};
pub use listing::Listing;
pub use memory::MemoryObjectStore;
pub use object::{Commit, IndexEntry, IndexState, ObjectStore, RawObject};
pub use pathspec::{Interest, Pathspec, PathspecSet};
pub use repository::GitRepository;
pub use tree::{Tree, TreeEntries, TreeEntry, TreeRef};
pub use walk::{Visit, Visitor, read_tree, read_tree_at};
