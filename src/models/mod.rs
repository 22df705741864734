//! Data transfer objects for walk output.
//!
//! These structs are serialized to JSON by the CLI's `--json` mode.
//! - `tree`: EntryType, ListedEntry

pub mod tree;

pub use tree::*;
