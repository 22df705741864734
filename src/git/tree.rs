//! Lazily parsed tree objects and their entry stream.
//!
//! A `Tree` starts out `Unparsed` and only holds its identity. Parsing
//! attaches the raw entry buffer; from then on the buffer is fixed until
//! `free_buffer` drops it again. Entries are decoded on the fly from that
//! buffer, in stored order, and borrow from it.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use git2::{ObjectType, Oid};

use crate::error::{Result, TreeError};
use crate::git::mode::canon_mode;
use crate::git::object::ObjectStore;

/// Raw size of a SHA-1 object id inside a tree record.
pub const OID_RAWSZ: usize = 20;

/// Shared handle to a cached tree object.
pub type TreeRef = Rc<RefCell<Tree>>;

#[derive(Debug, Clone)]
enum TreeState {
    Unparsed,
    Parsed { buffer: Arc<[u8]> },
}

#[derive(Debug, Clone)]
pub struct Tree {
    oid: Oid,
    state: TreeState,
}

impl Tree {
    pub fn new(oid: Oid) -> Self {
        Self {
            oid,
            state: TreeState::Unparsed,
        }
    }

    pub fn id(&self) -> Oid {
        self.oid
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self.state, TreeState::Parsed { .. })
    }

    /// Byte length of the parsed buffer, zero while unparsed.
    pub fn size(&self) -> usize {
        match &self.state {
            TreeState::Unparsed => 0,
            TreeState::Parsed { buffer } => buffer.len(),
        }
    }

    pub fn buffer(&self) -> Option<&[u8]> {
        match &self.state {
            TreeState::Unparsed => None,
            TreeState::Parsed { buffer } => Some(buffer),
        }
    }

    pub(crate) fn shared_buffer(&self) -> Option<Arc<[u8]>> {
        match &self.state {
            TreeState::Unparsed => None,
            TreeState::Parsed { buffer } => Some(Arc::clone(buffer)),
        }
    }

    /// Take ownership of `buffer` as this tree's content.
    ///
    /// A tree that is already parsed keeps its current buffer and `buffer`
    /// is dropped; callers that need to know which one won should check
    /// `is_parsed` first.
    pub fn parse_buffer(&mut self, buffer: Vec<u8>) -> Result<()> {
        if self.is_parsed() {
            return Ok(());
        }
        self.state = TreeState::Parsed {
            buffer: buffer.into(),
        };
        Ok(())
    }

    /// Fetch and parse the tree from `store` unless already parsed.
    ///
    /// With `quiet` set a missing object still fails but is not logged.
    pub fn parse_gently(&mut self, store: &dyn ObjectStore, quiet: bool) -> Result<()> {
        if self.is_parsed() {
            return Ok(());
        }
        let Some(object) = store.read_object(self.oid)? else {
            if !quiet {
                tracing::error!("Could not read {}", self.oid);
            }
            return Err(TreeError::MissingObject(self.oid));
        };
        if object.kind != ObjectType::Tree {
            tracing::error!("Object {} not a tree", self.oid);
            return Err(TreeError::WrongType {
                oid: self.oid,
                expected: ObjectType::Tree,
                actual: Some(object.kind),
            });
        }
        self.parse_buffer(object.data)
    }

    pub fn parse(&mut self, store: &dyn ObjectStore) -> Result<()> {
        self.parse_gently(store, false)
    }

    /// Drop the buffer and go back to `Unparsed`.
    pub fn free_buffer(&mut self) {
        self.state = TreeState::Unparsed;
    }

    /// Entries of a parsed tree, `None` while unparsed.
    pub fn entries(&self) -> Option<TreeEntries<'_>> {
        self.buffer().map(|buf| TreeEntries::new(self.oid, buf))
    }
}

/// One decoded tree record. Borrowed from the tree buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEntry<'a> {
    pub name: &'a [u8],
    pub mode: u32,
    pub oid: Oid,
}

impl TreeEntry<'_> {
    pub fn name_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.name)
    }
}

/// Iterator over the records of a raw tree buffer.
///
/// Yields an error once and then stops if the buffer is malformed.
pub struct TreeEntries<'a> {
    oid: Oid,
    buf: &'a [u8],
    failed: bool,
}

impl<'a> TreeEntries<'a> {
    pub fn new(oid: Oid, buf: &'a [u8]) -> Self {
        Self {
            oid,
            buf,
            failed: false,
        }
    }
}

impl<'a> Iterator for TreeEntries<'a> {
    type Item = Result<TreeEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.buf.is_empty() {
            return None;
        }
        match decode_entry(self.buf) {
            Ok((entry, rest)) => {
                self.buf = rest;
                Some(Ok(entry))
            }
            Err(reason) => {
                self.failed = true;
                Some(Err(TreeError::CorruptTree {
                    oid: self.oid,
                    reason: reason.to_string(),
                }))
            }
        }
    }
}

// <octal mode> SP <name> NUL <raw oid>
fn decode_entry(buf: &[u8]) -> std::result::Result<(TreeEntry<'_>, &[u8]), &'static str> {
    if buf.len() < OID_RAWSZ + 3 {
        return Err("too-short tree object");
    }
    let sp = buf
        .iter()
        .position(|&b| b == b' ')
        .ok_or("malformed mode in tree entry")?;
    let mode = parse_mode(&buf[..sp]).ok_or("malformed mode in tree entry")?;

    let rest = &buf[sp + 1..];
    let nul = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or("too-short tree file")?;
    if nul == 0 {
        return Err("empty filename in tree entry");
    }
    let name = &rest[..nul];

    let rest = &rest[nul + 1..];
    if rest.len() < OID_RAWSZ {
        return Err("too-short tree file");
    }
    let oid = Oid::from_bytes(&rest[..OID_RAWSZ]).map_err(|_| "bad object id in tree entry")?;

    let entry = TreeEntry {
        name,
        mode: canon_mode(mode),
        oid,
    };
    Ok((entry, &rest[OID_RAWSZ..]))
}

fn parse_mode(digits: &[u8]) -> Option<u32> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0u32, |mode, &c| match c {
        b'0'..=b'7' => mode.checked_mul(8)?.checked_add(u32::from(c - b'0')),
        _ => None,
    })
}
