//! Tree entry mode bits.

pub const S_IFMT: u32 = 0o170000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFLNK: u32 = 0o120000;
pub const S_IFGITLINK: u32 = 0o160000;

pub const MODE_TREE: u32 = S_IFDIR;
pub const MODE_BLOB: u32 = 0o100644;
pub const MODE_BLOB_EXECUTABLE: u32 = 0o100755;
pub const MODE_LINK: u32 = S_IFLNK;
pub const MODE_GITLINK: u32 = S_IFGITLINK;

pub fn is_dir(mode: u32) -> bool {
    mode & S_IFMT == S_IFDIR
}

pub fn is_reg(mode: u32) -> bool {
    mode & S_IFMT == S_IFREG
}

pub fn is_link(mode: u32) -> bool {
    mode & S_IFMT == S_IFLNK
}

/// Entry points at a commit in a nested repository.
pub fn is_gitlink(mode: u32) -> bool {
    mode & S_IFMT == S_IFGITLINK
}

/// Collapse a stored mode onto one of the five modes a tree may carry.
///
/// Regular files keep only the owner-execute bit; anything that is not a
/// file, symlink or directory is treated as a gitlink.
pub fn canon_mode(mode: u32) -> u32 {
    if is_reg(mode) {
        if mode & 0o100 != 0 {
            MODE_BLOB_EXECUTABLE
        } else {
            MODE_BLOB
        }
    } else if is_link(mode) {
        MODE_LINK
    } else if is_dir(mode) {
        MODE_TREE
    } else {
        MODE_GITLINK
    }
}
