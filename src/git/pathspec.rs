//! Pathspec queries used to prune a walk.
//!
//! The walker only depends on the `Pathspec` trait. `PathspecSet` is the
//! default engine: literal paths plus shell-style wildcards.

use glob::Pattern;

use crate::error::{Result, TreeError};
use crate::git::mode::{is_dir, is_gitlink};
use crate::git::object::IndexState;
use crate::git::tree::TreeEntry;

/// Classification of one tree entry against a pathspec.
///
/// The two `All*` variants speak for the entry and every entry after it in
/// the same tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    AllEntriesNotInteresting,
    EntryNotInteresting,
    EntryInteresting,
    AllEntriesInteresting,
}

pub trait Pathspec {
    /// Classify `entry`, found under `base` (empty or ending in `/`).
    fn classify(&self, index: Option<&IndexState>, entry: &TreeEntry<'_>, base: &[u8]) -> Interest;

    /// Whether gitlink entries are followed into their repositories.
    fn recurse_submodules(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
struct PathspecItem {
    raw: Vec<u8>,
    /// Length of the leading part that contains no wildcard.
    nowildcard_len: usize,
    pattern: Option<Pattern>,
    /// Written with a trailing `/`: the final component only matches trees
    /// and gitlinks.
    dir_only: bool,
}

impl PathspecItem {
    fn parse(item: &str) -> Result<Self> {
        let trimmed = item.trim_end_matches('/');
        let trimmed = if trimmed == "." { "" } else { trimmed };
        let dir_only = !trimmed.is_empty() && item.ends_with('/');
        let raw = trimmed.as_bytes().to_vec();
        let nowildcard_len = raw
            .iter()
            .position(|b| matches!(b, b'*' | b'?' | b'[' | b'\\'))
            .unwrap_or(raw.len());
        let pattern = if nowildcard_len < raw.len() {
            let pattern = Pattern::new(trimmed)
                .map_err(|e| TreeError::InvalidPathspec(format!("{item}: {e}")))?;
            Some(pattern)
        } else {
            None
        };
        Ok(Self {
            raw,
            nowildcard_len,
            pattern,
            dir_only,
        })
    }

    fn literal(&self) -> &[u8] {
        &self.raw[..self.nowildcard_len]
    }

    /// `base` is strictly below this literal item.
    fn contains_base(&self, base: &[u8]) -> bool {
        self.pattern.is_none()
            && (self.raw.is_empty()
                || (base.len() > self.raw.len()
                    && base.starts_with(&self.raw)
                    && base[self.raw.len()] == b'/'))
    }

    /// Something under `base` could still match this item.
    fn reachable_from(&self, base: &[u8]) -> bool {
        let lit = self.literal();
        match self.pattern {
            None => self.raw.starts_with(base),
            Some(_) => lit.starts_with(base) || base.starts_with(lit),
        }
    }

    /// `dir` is set when the walk can descend below `path`; `mode` is the
    /// entry's own mode.
    fn matches(&self, path: &[u8], mode: u32, dir: bool) -> bool {
        let kind_ok = !self.dir_only || is_dir(mode) || is_gitlink(mode);
        match &self.pattern {
            None => {
                (kind_ok && path == self.raw.as_slice())
                    || (dir
                        && self.raw.len() > path.len()
                        && self.raw.starts_with(path)
                        && self.raw[path.len()] == b'/')
            }
            Some(pattern) => {
                if kind_ok && pattern.matches(&String::from_utf8_lossy(path)) {
                    return true;
                }
                if !dir {
                    return false;
                }
                let mut leading = path.to_vec();
                leading.push(b'/');
                let lit = self.literal();
                lit.starts_with(&leading) || leading.starts_with(lit)
            }
        }
    }
}

/// A set of pathspec items; an entry is interesting if any item matches.
#[derive(Debug, Clone, Default)]
pub struct PathspecSet {
    items: Vec<PathspecItem>,
    recurse_submodules: bool,
}

impl PathspecSet {
    pub fn new<I, S>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items = items
            .into_iter()
            .map(|item| PathspecItem::parse(item.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            items,
            recurse_submodules: false,
        })
    }

    /// Matches every path.
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn with_recurse_submodules(mut self, recurse: bool) -> Self {
        self.recurse_submodules = recurse;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Pathspec for PathspecSet {
    fn classify(&self, _index: Option<&IndexState>, entry: &TreeEntry<'_>, base: &[u8]) -> Interest {
        if self.items.is_empty() {
            return Interest::AllEntriesInteresting;
        }

        let mut path = Vec::with_capacity(base.len() + entry.name.len());
        path.extend_from_slice(base);
        path.extend_from_slice(entry.name);
        // Followed gitlinks lead into a tree just like directories do
        let dir = is_dir(entry.mode) || (self.recurse_submodules && is_gitlink(entry.mode));

        let mut reachable = false;
        for item in &self.items {
            if item.contains_base(base) {
                return Interest::AllEntriesInteresting;
            }
            if !item.reachable_from(base) {
                continue;
            }
            reachable = true;
            if item.matches(&path, entry.mode, dir) {
                return Interest::EntryInteresting;
            }
        }

        if reachable {
            Interest::EntryNotInteresting
        } else {
            Interest::AllEntriesNotInteresting
        }
    }

    fn recurse_submodules(&self) -> bool {
        self.recurse_submodules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mode::{MODE_BLOB, MODE_GITLINK, MODE_TREE};
    use crate::test_utils::oid_of;

    fn entry(name: &str, mode: u32) -> TreeEntry<'_> {
        TreeEntry {
            name: name.as_bytes(),
            mode,
            oid: oid_of(1),
        }
    }

    fn classify(spec: &PathspecSet, base: &str, name: &str, mode: u32) -> Interest {
        spec.classify(None, &entry(name, mode), base.as_bytes())
    }

    #[test]
    fn test_empty_set_matches_everything() {
        let spec = PathspecSet::match_all();
        assert_eq!(classify(&spec, "", "a", MODE_BLOB), Interest::AllEntriesInteresting);
        assert!(!spec.recurse_submodules());
        assert!(spec.with_recurse_submodules(true).recurse_submodules());
    }

    #[test]
    fn test_literal_file() {
        let spec = PathspecSet::new(["src/lib.rs"]).unwrap();
        assert_eq!(classify(&spec, "", "src", MODE_TREE), Interest::EntryInteresting);
        assert_eq!(classify(&spec, "", "src", MODE_BLOB), Interest::EntryNotInteresting);
        assert_eq!(classify(&spec, "", "docs", MODE_TREE), Interest::EntryNotInteresting);
        assert_eq!(classify(&spec, "src/", "lib.rs", MODE_BLOB), Interest::EntryInteresting);
        assert_eq!(classify(&spec, "src/", "main.rs", MODE_BLOB), Interest::EntryNotInteresting);
        assert_eq!(
            classify(&spec, "docs/", "index.md", MODE_BLOB),
            Interest::AllEntriesNotInteresting
        );
    }

    #[test]
    fn test_literal_directory_covers_subtree() {
        let spec = PathspecSet::new(["src/"]).unwrap();
        assert_eq!(classify(&spec, "", "src", MODE_TREE), Interest::EntryInteresting);
        assert_eq!(classify(&spec, "src/", "anything", MODE_BLOB), Interest::AllEntriesInteresting);
        assert_eq!(classify(&spec, "src/deep/", "x", MODE_BLOB), Interest::AllEntriesInteresting);
        // "srcs" shares bytes but not the directory boundary
        assert_eq!(classify(&spec, "", "srcs", MODE_TREE), Interest::EntryNotInteresting);
    }

    #[test]
    fn test_trailing_slash_only_matches_directories() {
        let spec = PathspecSet::new(["src/"]).unwrap();
        assert_eq!(classify(&spec, "", "src", MODE_BLOB), Interest::EntryNotInteresting);
        assert_eq!(classify(&spec, "", "src", MODE_GITLINK), Interest::EntryInteresting);

        let spec = PathspecSet::new(["src"]).unwrap();
        assert_eq!(classify(&spec, "", "src", MODE_BLOB), Interest::EntryInteresting);

        let spec = PathspecSet::new(["docs/*/"]).unwrap();
        assert_eq!(classify(&spec, "docs/", "guide", MODE_TREE), Interest::EntryInteresting);
        assert_eq!(classify(&spec, "docs/", "index.md", MODE_BLOB), Interest::EntryNotInteresting);
    }

    #[test]
    fn test_dot_matches_everything() {
        let spec = PathspecSet::new(["."]).unwrap();
        assert_eq!(classify(&spec, "a/b/", "c", MODE_BLOB), Interest::AllEntriesInteresting);
    }

    #[test]
    fn test_wildcard_item() {
        let spec = PathspecSet::new(["src/*.rs"]).unwrap();
        assert_eq!(classify(&spec, "", "src", MODE_TREE), Interest::EntryInteresting);
        assert_eq!(classify(&spec, "", "README.md", MODE_BLOB), Interest::EntryNotInteresting);
        assert_eq!(classify(&spec, "src/", "lib.rs", MODE_BLOB), Interest::EntryInteresting);
        assert_eq!(classify(&spec, "src/", "notes.txt", MODE_BLOB), Interest::EntryNotInteresting);
        // '*' crosses directory separators
        assert_eq!(classify(&spec, "src/", "git", MODE_TREE), Interest::EntryInteresting);
        assert_eq!(classify(&spec, "src/git/", "walk.rs", MODE_BLOB), Interest::EntryInteresting);
        assert_eq!(
            classify(&spec, "docs/", "x.rs", MODE_BLOB),
            Interest::AllEntriesNotInteresting
        );
    }

    #[test]
    fn test_gitlink_leads_into_submodule_only_when_recursing() {
        let spec = PathspecSet::new(["libs/sub/file"]).unwrap();
        assert_eq!(classify(&spec, "libs/", "sub", MODE_GITLINK), Interest::EntryNotInteresting);

        let spec = spec.with_recurse_submodules(true);
        assert_eq!(classify(&spec, "libs/", "sub", MODE_GITLINK), Interest::EntryInteresting);
        assert_eq!(classify(&spec, "libs/sub/", "file", MODE_BLOB), Interest::EntryInteresting);

        let spec = PathspecSet::new(["libs/sub"]).unwrap();
        assert_eq!(classify(&spec, "libs/", "sub", MODE_GITLINK), Interest::EntryInteresting);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            PathspecSet::new(["src/[a"]),
            Err(TreeError::InvalidPathspec(_))
        ));
    }
}
