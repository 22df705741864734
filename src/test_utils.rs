//! Test utilities: hand-built tree objects and temporary git repositories.
//!
//! This module is only compiled for tests and with the `test-utils` feature.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use git2::{ObjectType, Oid};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

use crate::git::compare::base_name_compare;
use crate::git::memory::MemoryObjectStore;

/// Object id made of twenty copies of `n`.
pub fn oid_of(n: u8) -> Oid {
    Oid::from_bytes(&[n; 20]).expect("20 bytes is a valid oid")
}

/// Builder for raw tree buffers.
#[derive(Debug, Clone, Default)]
pub struct TreeFixture {
    entries: Vec<(u32, Vec<u8>, Oid)>,
}

impl TreeFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, mode: u32, name: &str, oid: Oid) -> Self {
        self.entries.push((mode, name.as_bytes().to_vec(), oid));
        self
    }

    /// Encode the entries in the order they were added.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for (mode, name, oid) in &self.entries {
            buf.extend_from_slice(format!("{mode:o} ").as_bytes());
            buf.extend_from_slice(name);
            buf.push(0);
            buf.extend_from_slice(oid.as_bytes());
        }
        buf
    }

    /// Encode the entries in canonical git order.
    pub fn encode_sorted(&self) -> Vec<u8> {
        let mut sorted = self.clone();
        sorted
            .entries
            .sort_by(|a, b| base_name_compare(&a.1, a.0, &b.1, b.0).cmp(&0));
        sorted.encode()
    }

    /// Store the tree (in canonical order) and return its id.
    pub fn insert(&self, store: &MemoryObjectStore) -> Oid {
        store
            .insert(ObjectType::Tree, self.encode_sorted())
            .expect("Failed to insert tree")
    }
}

/// Shared buffer that collects formatted log output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        let buf = self.0.lock().expect("Log buffer lock poisoned");
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("Log buffer lock poisoned")
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a subscriber that records every event on this thread and
/// return its result together with the formatted logs.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}

/// A temporary git repository driven through the git CLI.
///
/// The repository is removed when dropped.
pub struct TestRepo {
    dir: TempDir,
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRepo {
    /// Create a temporary directory with git initialized.
    ///
    /// Also configures user.email and user.name for commits.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repo = Self { dir };
        repo.git(&["init", "-q"]);
        repo.git(&["config", "user.email", "test@test.com"]);
        repo.git(&["config", "user.name", "Test"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run git in the repository and return its trimmed stdout.
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Write a file and stage it. Creates parent directories as needed.
    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        self.git(&["add", path]);
        full_path
    }

    /// Commit everything staged and return the new HEAD id.
    pub fn commit(&self, message: &str) -> Oid {
        self.git(&["commit", "-q", "--allow-empty", "-m", message]);
        self.head()
    }

    pub fn head(&self) -> Oid {
        let hex = self.git(&["rev-parse", "HEAD"]);
        Oid::from_str(&hex).expect("rev-parse printed an invalid id")
    }

    /// Clone `other` into `path` as a submodule and stage it.
    pub fn add_submodule(&self, other: &TestRepo, path: &str) {
        let url = other.path().to_string_lossy().to_string();
        self.git(&[
            "-c",
            "protocol.file.allow=always",
            "submodule",
            "add",
            &url,
            path,
        ]);
    }
}
