//! Orderings over tree entry names.
//!
//! All three compare raw bytes; a name's "next byte" past its end is taken
//! as NUL, except that a directory which ends at the shared length sorts as
//! if it were followed by `/`. Callers pick the one matching their need:
//!
//! - `name_compare`: plain byte order, shorter prefix first
//! - `base_name_compare`: tree order, directories sort as `name/`
//! - `df_name_compare`: tree order, but a directory and a file of the same
//!   name compare equal so they can be handled together

use std::cmp::Ordering;

use crate::git::mode::is_dir;

fn memcmp(a: &[u8], b: &[u8]) -> i32 {
    match a.cmp(b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

fn next_byte(name: &[u8], len: usize, mode: u32) -> u8 {
    match name.get(len) {
        Some(&c) => c,
        None if is_dir(mode) => b'/',
        None => 0,
    }
}

/// Byte-wise comparison where an equal prefix puts the shorter name first.
pub fn name_compare(name1: &[u8], name2: &[u8]) -> i32 {
    let len = name1.len().min(name2.len());
    let cmp = memcmp(&name1[..len], &name2[..len]);
    if cmp != 0 {
        return cmp;
    }
    match name1.len().cmp(&name2.len()) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// Git tree order: `foo` as a directory sorts after `foo.c`, because it
/// compares as `foo/`.
pub fn base_name_compare(name1: &[u8], mode1: u32, name2: &[u8], mode2: u32) -> i32 {
    let len = name1.len().min(name2.len());
    let cmp = memcmp(&name1[..len], &name2[..len]);
    if cmp != 0 {
        return cmp;
    }
    let c1 = next_byte(name1, len, mode1);
    let c2 = next_byte(name2, len, mode2);
    match c1.cmp(&c2) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// Same as `base_name_compare`, except a directory and a file with the same
/// name compare equal.
///
/// Both still order differently against a name with a dot after the shared
/// base (`'\0' < '.' < '/'`), so the relation is not transitive over such
/// triples.
pub fn df_name_compare(name1: &[u8], mode1: u32, name2: &[u8], mode2: u32) -> i32 {
    let len = name1.len().min(name2.len());
    let cmp = memcmp(&name1[..len], &name2[..len]);
    if cmp != 0 {
        return cmp;
    }
    if name1.len() == name2.len() {
        return 0;
    }
    let c1 = next_byte(name1, len, mode1);
    let c2 = next_byte(name2, len, mode2);
    if (c1 == b'/' && c2 == 0) || (c2 == b'/' && c1 == 0) {
        return 0;
    }
    i32::from(c1) - i32::from(c2)
}
