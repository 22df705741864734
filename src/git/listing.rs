use git2::Oid;

use crate::git::context::RepoContext;
use crate::git::mode::{is_dir, is_gitlink};
use crate::git::walk::{Visit, Visitor};
use crate::models::{EntryType, ListedEntry};

/// Visitor that collects every visited entry, `ls-tree` style.
///
/// Non-recursive listings still report directories and gitlinks but do not
/// descend into them.
#[derive(Debug, Default)]
pub struct Listing {
    pub entries: Vec<ListedEntry>,
    recursive: bool,
}

impl Listing {
    pub fn new(recursive: bool) -> Self {
        Self {
            entries: Vec::new(),
            recursive,
        }
    }

    pub fn into_entries(self) -> Vec<ListedEntry> {
        self.entries
    }
}

impl Visitor for Listing {
    fn visit(&mut self, _repo: &RepoContext, oid: Oid, base: &[u8], name: &[u8], mode: u32) -> Visit {
        let name = String::from_utf8_lossy(name).into_owned();
        let mut path = String::from_utf8_lossy(base).into_owned();
        path.push_str(&name);

        self.entries.push(ListedEntry {
            path,
            name,
            mode: format!("{mode:06o}"),
            entry_type: EntryType::from_mode(mode),
            oid: oid.to_string(),
        });

        if self.recursive && (is_dir(mode) || is_gitlink(mode)) {
            Visit::Recurse
        } else {
            Visit::Skip
        }
    }
}
