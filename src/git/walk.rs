//! Recursive, pathspec-filtered tree traversal.
//!
//! `read_tree_at` visits the entries of one tree in stored order. Each entry
//! the pathspec finds interesting is handed to a `Visitor`, whose verdict
//! decides whether the walk descends into it (directories, and gitlinks when
//! the pathspec recurses into submodules), moves on, or stops altogether.
//!
//! The accumulated path of the entry being visited lives in a single byte
//! buffer shared by the whole walk. Every level appends to it before
//! descending and truncates it back on the way out, errors included.

use std::ops::{Deref, DerefMut};

use git2::Oid;

use crate::error::{Result, TreeError};
use crate::git::context::{DepthMode, RepoContext};
use crate::git::mode::{is_dir, is_gitlink};
use crate::git::pathspec::{Interest, Pathspec};
use crate::git::submodule::read_submodule_tree;
use crate::git::tree::{TreeEntries, TreeRef};

/// What to do after visiting an entry.
#[derive(Debug)]
pub enum Visit {
    /// Go on with the next sibling.
    Skip,
    /// Descend into the entry if it is a tree or a followed gitlink.
    Recurse,
    /// Stop the whole walk and report `VisitorAborted`.
    Abort(anyhow::Error),
}

pub trait Visitor {
    /// Called for each interesting entry. `base` is the path of the
    /// containing tree (empty or ending in `/`), `name` the entry's own name.
    fn visit(&mut self, repo: &RepoContext, oid: Oid, base: &[u8], name: &[u8], mode: u32) -> Visit;
}

impl<F> Visitor for F
where
    F: FnMut(&RepoContext, Oid, &[u8], &[u8], u32) -> Visit,
{
    fn visit(&mut self, repo: &RepoContext, oid: Oid, base: &[u8], name: &[u8], mode: u32) -> Visit {
        self(repo, oid, base, name, mode)
    }
}

/// Restores a path buffer to its original length when dropped.
pub(crate) struct BaseGuard<'a> {
    base: &'a mut Vec<u8>,
    len: usize,
}

impl<'a> BaseGuard<'a> {
    pub(crate) fn new(base: &'a mut Vec<u8>) -> Self {
        let len = base.len();
        Self { base, len }
    }
}

impl Deref for BaseGuard<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        self.base
    }
}

impl DerefMut for BaseGuard<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        self.base
    }
}

impl Drop for BaseGuard<'_> {
    fn drop(&mut self) {
        self.base.truncate(self.len);
    }
}

/// Depth to hand to the walk of a child tree.
pub(crate) fn child_depth(repo: &RepoContext, depth: usize) -> usize {
    match repo.options().depth_mode {
        DepthMode::PerCall => 0,
        DepthMode::Cumulative => depth + 1,
    }
}

/// Walk `tree` with `base` as the path prefix of its entries.
///
/// `depth` is checked against the context's limit before anything is read.
/// Failures inside the walk propagate as errors, except those raised while
/// crossing into a submodule, which come back as `TreeError::Fatal`.
pub fn read_tree_at<V: Visitor + ?Sized>(
    repo: &RepoContext,
    tree: &TreeRef,
    base: &mut Vec<u8>,
    depth: usize,
    pathspec: &dyn Pathspec,
    visitor: &mut V,
) -> Result<()> {
    let max = repo.options().max_tree_depth;
    if depth > max {
        tracing::error!("exceeded maximum allowed tree depth");
        return Err(TreeError::DepthExceeded { depth, max });
    }

    let (oid, buffer) = {
        let mut tree = tree.borrow_mut();
        tree.parse(repo.store())?;
        let Some(buffer) = tree.shared_buffer() else {
            return Err(TreeError::Internal(format!("tree {} lost its buffer", tree.id())));
        };
        (tree.id(), buffer)
    };

    let mut interest = Interest::EntryNotInteresting;
    for entry in TreeEntries::new(oid, &buffer) {
        let entry = entry?;

        if interest != Interest::AllEntriesInteresting {
            interest = pathspec.classify(repo.index(), &entry, base);
            match interest {
                Interest::AllEntriesNotInteresting => break,
                Interest::EntryNotInteresting => continue,
                Interest::EntryInteresting | Interest::AllEntriesInteresting => {}
            }
        }

        match visitor.visit(repo, entry.oid, base, entry.name, entry.mode) {
            Visit::Skip => continue,
            Visit::Recurse => {}
            Visit::Abort(err) => return Err(TreeError::VisitorAborted(err)),
        }

        if is_dir(entry.mode) {
            let mut base = BaseGuard::new(base);
            base.extend_from_slice(entry.name);
            base.push(b'/');
            let child = repo.lookup_tree(entry.oid);
            read_tree_at(repo, &child, &mut base, child_depth(repo, depth), pathspec, visitor)?;
        } else if pathspec.recurse_submodules() && is_gitlink(entry.mode) {
            read_submodule_tree(repo, &entry, base, depth, pathspec, visitor)?;
        }
        // anything else is a leaf: a file, or a gitlink we do not follow
    }

    Ok(())
}

/// Walk `tree` from the top with an empty path prefix.
pub fn read_tree<V: Visitor + ?Sized>(
    repo: &RepoContext,
    tree: &TreeRef,
    pathspec: &dyn Pathspec,
    visitor: &mut V,
) -> Result<()> {
    let mut base = Vec::new();
    read_tree_at(repo, tree, &mut base, 0, pathspec, visitor)
}
