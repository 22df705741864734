use git2::{ErrorCode, Object, ObjectType, Odb, Oid, Repository};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Result, TreeError};
use crate::git::object::{IndexEntry, IndexState, ObjectStore, RawObject};

/// Object store backed by a repository through libgit2.
pub struct GitRepository {
    pub repo: Mutex<Repository>,
    pub path: String,
}

impl GitRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let repo = Repository::discover(&path).map_err(|_| TreeError::RepoNotFound(path_str.clone()))?;

        Ok(Self::from_repo(repo, path_str))
    }

    /// Repository without a working directory whose objects live only in
    /// memory.
    pub fn in_memory() -> Result<Self> {
        let odb = Odb::new()?;
        odb.add_new_mempack_backend(1000)?;
        let repo = Repository::from_odb(odb)?;
        Ok(Self::from_repo(repo, ":memory:".to_string()))
    }

    pub fn from_repo(repo: Repository, path: String) -> Self {
        Self {
            repo: Mutex::new(repo),
            path,
        }
    }

    pub fn with_repo<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Repository) -> Result<T>,
    {
        let repo = self.repo.lock().map_err(|_| TreeError::Internal("Lock poisoned".to_string()))?;
        f(&repo)
    }

    /// Resolve a revision expression (`HEAD`, a branch, a hex id...) to an object id.
    pub fn resolve_rev(&self, spec: &str) -> Result<Oid> {
        self.with_repo(|repo| Ok(repo.revparse_single(spec)?.id()))
    }

    /// Write `data` to the object database as an object of `kind`.
    pub fn write_object(&self, kind: ObjectType, data: &[u8]) -> Result<Oid> {
        self.with_repo(|repo| Ok(repo.odb()?.write(kind, data)?))
    }
}

fn find_object(repo: &Repository, oid: Oid) -> Result<Object<'_>> {
    repo.find_object(oid, None).map_err(|e| match e.code() {
        ErrorCode::NotFound => TreeError::MissingObject(oid),
        _ => e.into(),
    })
}

impl ObjectStore for GitRepository {
    fn read_object(&self, oid: Oid) -> Result<Option<RawObject>> {
        self.with_repo(|repo| {
            let odb = repo.odb()?;
            match odb.read(oid) {
                Ok(object) => Ok(Some(RawObject {
                    kind: object.kind(),
                    data: object.data().to_vec(),
                })),
                Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn contains(&self, oid: Oid) -> Result<bool> {
        self.with_repo(|repo| Ok(repo.odb()?.exists(oid)))
    }

    fn peel_to_tree(&self, oid: Oid) -> Result<Oid> {
        self.with_repo(|repo| {
            let object = find_object(repo, oid)?;
            match object.kind() {
                Some(ObjectType::Tree | ObjectType::Commit | ObjectType::Tag) => {}
                actual => {
                    return Err(TreeError::WrongType {
                        oid,
                        expected: ObjectType::Tree,
                        actual,
                    });
                }
            }
            match object.peel_to_tree() {
                Ok(tree) => Ok(tree.id()),
                Err(e) if e.code() == ErrorCode::NotFound => Err(TreeError::MissingObject(oid)),
                // A tag whose target does not lead to a tree
                Err(e) if matches!(e.code(), ErrorCode::Peel | ErrorCode::InvalidSpec) => Err(TreeError::WrongType {
                    oid,
                    expected: ObjectType::Tree,
                    actual: None,
                }),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn commit_tree_id(&self, oid: Oid) -> Result<Option<Oid>> {
        self.with_repo(|repo| {
            let object = find_object(repo, oid)?;
            let actual = object.kind();
            let commit = object.into_commit().map_err(|_| TreeError::WrongType {
                oid,
                expected: ObjectType::Commit,
                actual,
            })?;
            let tree = commit.tree_id();
            Ok((!tree.is_zero()).then_some(tree))
        })
    }

    fn read_index(&self) -> Result<IndexState> {
        self.with_repo(|repo| {
            let index = repo.index()?;
            let entries = index
                .iter()
                .map(|entry| IndexEntry {
                    path: entry.path,
                    mode: entry.mode,
                    oid: entry.id,
                })
                .collect();
            Ok(IndexState { entries })
        })
    }

    fn open_submodule(&self, path: &str) -> Result<Box<dyn ObjectStore>> {
        self.with_repo(|repo| {
            let submodule = repo.find_submodule(path)?;
            let subrepo = submodule.open()?;
            let sub_path = subrepo
                .workdir()
                .unwrap_or_else(|| subrepo.path())
                .to_string_lossy()
                .to_string();
            tracing::debug!("Opened submodule {} at {}", path, sub_path);
            Ok(Box::new(GitRepository::from_repo(subrepo, sub_path)) as Box<dyn ObjectStore>)
        })
    }

    fn max_tree_depth(&self) -> Option<usize> {
        self.with_repo(|repo| {
            let config = repo.config()?;
            Ok(config.get_i64("core.maxTreeDepth").ok())
        })
        .ok()
        .flatten()
        .and_then(|depth| usize::try_from(depth).ok())
    }
}
