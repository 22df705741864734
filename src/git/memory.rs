//! In-memory object store.
//!
//! Objects live in a libgit2 mempack backend, so trees, commits and tags
//! built by hand get the ids git would give them and are read back through
//! the same code as an on-disk repository. Nested repositories are
//! registered by their path relative to this store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use git2::{ObjectType, Oid, Signature, Time};

use crate::error::{Result, TreeError};
use crate::git::object::{IndexState, ObjectStore, RawObject};
use crate::git::repository::GitRepository;

struct Inner {
    repo: GitRepository,
    submodules: RwLock<HashMap<String, MemoryObjectStore>>,
    /// `None` simulates an index that fails to load.
    index: RwLock<Option<IndexState>>,
    max_tree_depth: RwLock<Option<usize>>,
    reads: AtomicUsize,
}

/// Cheaply cloneable handle; clones share the same objects.
#[derive(Clone)]
pub struct MemoryObjectStore {
    inner: Arc<Inner>,
}

fn signature() -> Result<Signature<'static>> {
    Ok(Signature::new("Test", "test@test.com", &Time::new(0, 0))?)
}

impl MemoryObjectStore {
    pub fn new() -> Result<Self> {
        let inner = Inner {
            repo: GitRepository::in_memory()?,
            submodules: RwLock::new(HashMap::new()),
            index: RwLock::new(Some(IndexState::default())),
            max_tree_depth: RwLock::new(None),
            reads: AtomicUsize::new(0),
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Store `data` as an object of `kind` and return its identity.
    pub fn insert(&self, kind: ObjectType, data: Vec<u8>) -> Result<Oid> {
        self.inner.repo.write_object(kind, &data)
    }

    /// Store a parentless commit of `tree`, which must already be stored.
    pub fn insert_commit(&self, tree: Oid) -> Result<Oid> {
        self.inner.repo.with_repo(|repo| {
            let tree = repo.find_tree(tree)?;
            let sig = signature()?;
            Ok(repo.commit(None, &sig, &sig, "commit", &tree, &[])?)
        })
    }

    /// Store an annotated tag pointing at `target`.
    pub fn insert_tag(&self, target: Oid, name: &str) -> Result<Oid> {
        self.inner.repo.with_repo(|repo| {
            let target = repo.find_object(target, None)?;
            let sig = signature()?;
            Ok(repo.tag_annotation_create(name, &target, &sig, "tag")?)
        })
    }

    /// Register `store` as the repository checked out at `path`.
    pub fn add_submodule(&self, path: &str, store: MemoryObjectStore) -> Result<()> {
        let mut submodules = self
            .inner
            .submodules
            .write()
            .map_err(|_| TreeError::Internal("Lock poisoned".to_string()))?;
        submodules.insert(path.to_string(), store);
        Ok(())
    }

    pub fn set_index(&self, index: Option<IndexState>) -> Result<()> {
        let mut slot = self
            .inner
            .index
            .write()
            .map_err(|_| TreeError::Internal("Lock poisoned".to_string()))?;
        *slot = index;
        Ok(())
    }

    pub fn set_max_tree_depth(&self, depth: Option<usize>) -> Result<()> {
        let mut slot = self
            .inner
            .max_tree_depth
            .write()
            .map_err(|_| TreeError::Internal("Lock poisoned".to_string()))?;
        *slot = depth;
        Ok(())
    }

    /// Number of `read_object` calls served so far.
    pub fn read_count(&self) -> usize {
        self.inner.reads.load(Ordering::Relaxed)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn read_object(&self, oid: Oid) -> Result<Option<RawObject>> {
        self.inner.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.repo.read_object(oid)
    }

    fn contains(&self, oid: Oid) -> Result<bool> {
        self.inner.repo.contains(oid)
    }

    fn peel_to_tree(&self, oid: Oid) -> Result<Oid> {
        self.inner.repo.peel_to_tree(oid)
    }

    fn commit_tree_id(&self, oid: Oid) -> Result<Option<Oid>> {
        self.inner.repo.commit_tree_id(oid)
    }

    fn read_index(&self) -> Result<IndexState> {
        let index = self
            .inner
            .index
            .read()
            .map_err(|_| TreeError::Internal("Lock poisoned".to_string()))?;
        index
            .clone()
            .ok_or_else(|| TreeError::Internal("index file corrupt".to_string()))
    }

    fn open_submodule(&self, path: &str) -> Result<Box<dyn ObjectStore>> {
        let submodules = self
            .inner
            .submodules
            .read()
            .map_err(|_| TreeError::Internal("Lock poisoned".to_string()))?;
        match submodules.get(path) {
            Some(store) => Ok(Box::new(store.clone())),
            None => Err(TreeError::RepoNotFound(path.to_string())),
        }
    }

    fn max_tree_depth(&self) -> Option<usize> {
        self.inner.max_tree_depth.read().ok().and_then(|d| *d)
    }
}
