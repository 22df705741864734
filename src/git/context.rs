//! Repository context used during a walk.
//!
//! A `RepoContext` pairs an object store with the in-memory state a walk
//! needs: the identity-keyed tree cache, the loaded index, walk options, and
//! (inside a submodule) the path prefix of that submodule relative to the
//! top-level superproject.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use git2::Oid;

use crate::error::{Result, TreeError};
use crate::git::object::{Commit, IndexState, ObjectStore};
use crate::git::tree::{Tree, TreeRef};

pub const DEFAULT_MAX_TREE_DEPTH: usize = 2048;

/// How the depth passed to a walk evolves as it descends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DepthMode {
    /// Every recursive call restarts at depth zero, so only the depth
    /// handed to the outermost call is ever checked.
    #[default]
    PerCall,
    /// Each level adds one, including levels inside submodules.
    Cumulative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    pub max_tree_depth: usize,
    pub depth_mode: DepthMode,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            depth_mode: DepthMode::PerCall,
        }
    }
}

pub struct RepoContext {
    store: Box<dyn ObjectStore>,
    trees: RefCell<HashMap<Oid, TreeRef>>,
    index: Option<IndexState>,
    submodule_prefix: Option<Vec<u8>>,
    options: WalkOptions,
}

impl RepoContext {
    /// Top-level context over `store`. The depth limit comes from the store
    /// when it configures one.
    pub fn new(store: Box<dyn ObjectStore>) -> Self {
        let mut options = WalkOptions::default();
        if let Some(depth) = store.max_tree_depth() {
            options.max_tree_depth = depth;
        }
        Self {
            store,
            trees: RefCell::new(HashMap::new()),
            index: None,
            submodule_prefix: None,
            options,
        }
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    pub fn index(&self) -> Option<&IndexState> {
        self.index.as_ref()
    }

    /// Path of this repository inside the top-level superproject, with a
    /// trailing `/`. `None` for the top-level repository.
    pub fn submodule_prefix(&self) -> Option<&[u8]> {
        self.submodule_prefix.as_deref()
    }

    /// Load the persisted index into this context.
    pub fn read_index(&mut self) -> Result<&IndexState> {
        let index = self.store.read_index()?;
        Ok(self.index.insert(index))
    }

    /// Cached tree object for `oid`, created unparsed on first lookup.
    pub fn lookup_tree(&self, oid: Oid) -> TreeRef {
        let mut trees = self.trees.borrow_mut();
        Rc::clone(
            trees
                .entry(oid)
                .or_insert_with(|| Rc::new(RefCell::new(Tree::new(oid)))),
        )
    }

    /// Parse the tree behind `oid`, peeling tags and commits on the way.
    pub fn parse_tree_indirect(&self, oid: Oid) -> Result<TreeRef> {
        let tree_oid = self.store.peel_to_tree(oid).inspect_err(|e| match e {
            TreeError::MissingObject(missing) => tracing::error!("Could not read {}", missing),
            TreeError::WrongType { .. } => tracing::error!("Object {} not a tree", oid),
            _ => {}
        })?;
        let tree = self.lookup_tree(tree_oid);
        tree.borrow_mut().parse(self.store())?;
        Ok(tree)
    }

    /// Commit handle for `oid`, or `None` if this repository lacks the object.
    pub fn lookup_commit(&self, oid: Oid) -> Result<Option<Commit>> {
        if self.store.contains(oid)? {
            Ok(Some(Commit::new(oid)))
        } else {
            Ok(None)
        }
    }

    pub fn parse_commit(&self, commit: &mut Commit) -> Result<()> {
        if commit.is_parsed() {
            return Ok(());
        }
        let tree = self.store.commit_tree_id(commit.id())?;
        commit.set_parsed(tree);
        Ok(())
    }

    /// Root tree of a parsed commit.
    pub fn commit_tree(&self, commit: &Commit) -> Option<TreeRef> {
        commit.tree_id().map(|oid| self.lookup_tree(oid))
    }

    /// Open the submodule at `path` (relative to this repository) as a
    /// nested context. The nested context inherits the walk options and
    /// extends the submodule prefix with `path/`.
    pub fn submodule(&self, path: &str) -> Result<RepoContext> {
        let store = self.store.open_submodule(path)?;

        let mut prefix = self.submodule_prefix.clone().unwrap_or_default();
        prefix.extend_from_slice(path.as_bytes());
        prefix.push(b'/');

        Ok(RepoContext {
            store,
            trees: RefCell::new(HashMap::new()),
            index: None,
            submodule_prefix: Some(prefix),
            options: self.options,
        })
    }
}

impl Drop for RepoContext {
    fn drop(&mut self) {
        if let Some(prefix) = &self.submodule_prefix {
            tracing::debug!(
                "Releasing submodule context {}",
                String::from_utf8_lossy(prefix)
            );
        }
    }
}
