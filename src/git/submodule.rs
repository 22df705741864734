//! Crossing a gitlink into the repository checked out behind it.
//!
//! Anything that goes wrong here is unrecoverable for the walk as a whole
//! and comes back as `TreeError::Fatal`.

use git2::Oid;

use crate::error::{FatalError, Result, TreeError};
use crate::git::context::RepoContext;
use crate::git::pathspec::Pathspec;
use crate::git::tree::TreeEntry;
use crate::git::walk::{BaseGuard, Visitor, child_depth, read_tree_at};

fn fatal(err: FatalError) -> TreeError {
    tracing::error!("{}", err);
    TreeError::Fatal(err)
}

/// Path of the gitlink at `full` relative to the repository of `repo`.
fn relative_path<'a>(repo: &RepoContext, full: &'a [u8]) -> &'a [u8] {
    match repo.submodule_prefix() {
        Some(prefix) => {
            debug_assert!(full.starts_with(prefix), "path outside of submodule");
            let path = full.strip_prefix(prefix).unwrap_or(full);
            path.strip_prefix(b"/").unwrap_or(path)
        }
        None => full,
    }
}

/// Walk the tree of the commit a gitlink `entry` records, inside the
/// submodule's own repository. `base` is the path of the containing tree
/// and is restored before returning.
pub(crate) fn read_submodule_tree<V: Visitor + ?Sized>(
    repo: &RepoContext,
    entry: &TreeEntry<'_>,
    base: &mut Vec<u8>,
    depth: usize,
    pathspec: &dyn Pathspec,
    visitor: &mut V,
) -> Result<()> {
    let mut base = BaseGuard::new(base);
    base.extend_from_slice(entry.name);

    let rel = relative_path(repo, &base);
    let path = match std::str::from_utf8(rel) {
        Ok(path) => path.to_string(),
        Err(_) => {
            let path = String::from_utf8_lossy(rel).into_owned();
            return Err(fatal(FatalError::SubmoduleInit {
                path: path.clone(),
                source: Box::new(TreeError::RepoNotFound(path)),
            }));
        }
    };

    let mut subrepo = repo.submodule(&path).map_err(|e| {
        fatal(FatalError::SubmoduleInit {
            path: path.clone(),
            source: Box::new(e),
        })
    })?;
    tracing::debug!("Entering submodule {}", path);

    if let Err(e) = subrepo.read_index() {
        return Err(fatal(FatalError::IndexCorrupt(Box::new(e))));
    }

    let mut commit = match subrepo.lookup_commit(entry.oid) {
        Ok(Some(commit)) => commit,
        Ok(None) => {
            return Err(fatal(FatalError::CommitNotFound {
                oid: entry.oid,
                path,
            }));
        }
        Err(e) => {
            return Err(fatal(FatalError::InvalidCommit {
                oid: entry.oid,
                path,
                source: Box::new(e),
            }));
        }
    };
    if let Err(e) = subrepo.parse_commit(&mut commit) {
        return Err(fatal(FatalError::InvalidCommit {
            oid: entry.oid,
            path,
            source: Box::new(e),
        }));
    }

    // A commit without a tree has nothing to walk
    let tree = match subrepo.commit_tree(&commit) {
        Some(tree) => tree,
        None => {
            let tree = subrepo.lookup_tree(Oid::zero());
            tree.borrow_mut().parse_buffer(Vec::new())?;
            tree
        }
    };

    base.push(b'/');
    let result = read_tree_at(
        &subrepo,
        &tree,
        &mut base,
        child_depth(repo, depth),
        pathspec,
        visitor,
    );

    match result {
        Ok(()) => {}
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            return Err(fatal(FatalError::SubtreeFailed {
                path: String::from_utf8_lossy(&base).into_owned(),
                source: Box::new(e),
            }));
        }
    }

    drop(base);
    drop(subrepo);
    Ok(())
}
