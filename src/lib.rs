//! Pathspec-filtered recursive traversal of git tree objects.
//!
//! The entry point is [`git::read_tree_at`]: it walks a tree depth-first in
//! stored order, asks a [`git::Pathspec`] which entries are interesting,
//! hands those to a [`git::Visitor`], and can follow gitlinks into
//! submodule repositories.

pub mod error;
pub mod git;
pub mod models;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{FatalError, Result, TreeError};
