//! Tree listing DTOs.
//!
//! - `EntryType`: what kind of object an entry points at, derived from its mode
//! - `ListedEntry`: one visited entry, as printed or serialized by the CLI

use serde::{Deserialize, Serialize};

use crate::git::mode::{is_dir, is_gitlink, is_link};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
    Symlink,
    Submodule,
}

impl EntryType {
    pub fn from_mode(mode: u32) -> Self {
        if is_dir(mode) {
            EntryType::Directory
        } else if is_gitlink(mode) {
            EntryType::Submodule
        } else if is_link(mode) {
            EntryType::Symlink
        } else {
            EntryType::File
        }
    }

    /// Object type name as `git ls-tree` prints it.
    pub fn object_kind(&self) -> &'static str {
        match self {
            EntryType::Directory => "tree",
            EntryType::Submodule => "commit",
            EntryType::File | EntryType::Symlink => "blob",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListedEntry {
    /// Full path from the top-level tree, across submodules.
    pub path: String,
    pub name: String,
    /// Six-digit octal mode, e.g. `100644`.
    pub mode: String,
    pub entry_type: EntryType,
    pub oid: String,
}

impl ListedEntry {
    /// `<mode> <type> <oid>\t<path>`
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {}\t{}",
            self.mode,
            self.entry_type.object_kind(),
            self.oid,
            self.path
        )
    }
}
