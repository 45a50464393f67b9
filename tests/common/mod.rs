// Shared helpers for integration tests.
//
// Provides a temporary home directory with a dotfiles repository inside it
// and a fluent builder so each integration test can describe the repository
// and the pre-existing home contents without repeating filesystem
// boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use nvs_cli::logging::{LinkStatus, Log};

/// An isolated home directory backed by a [`tempfile::TempDir`].
///
/// Layout: `<tmp>/home` is the home directory and `<tmp>/repo` the dotfiles
/// repository.  Everything is deleted when the sandbox is dropped.
pub struct Sandbox {
    tmp: tempfile::TempDir,
}

impl Sandbox {
    /// Path to the dotfiles repository.
    pub fn repo(&self) -> PathBuf {
        self.tmp.path().join("repo")
    }

    /// Path to the home directory.
    pub fn home(&self) -> PathBuf {
        self.tmp.path().join("home")
    }

    /// Path of `name` inside the home directory.
    pub fn home_path(&self, name: &str) -> PathBuf {
        self.home().join(name)
    }

    /// Read a file under the home directory.
    pub fn read_home(&self, name: &str) -> String {
        std::fs::read_to_string(self.home_path(name)).expect("read home file")
    }

    /// Return `true` if `name` under the home directory is a symlink.
    pub fn is_symlink(&self, name: &str) -> bool {
        self.home_path(name)
            .symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink())
    }

    /// Names under the home directory that start with `<name>.backup.`.
    pub fn backups_of(&self, name: &str) -> Vec<PathBuf> {
        let target = self.home_path(name);
        let dir = target.parent().expect("target has a parent");
        let prefix = format!(
            "{}.backup.",
            target.file_name().expect("file name").to_string_lossy()
        );
        let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
            .expect("read home dir")
            .map(|e| e.expect("dir entry").path())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(&prefix))
            })
            .collect();
        found.sort();
        found
    }
}

/// Fluent builder for [`Sandbox`].
pub struct SandboxBuilder {
    sandbox: Sandbox,
}

impl SandboxBuilder {
    /// Begin with an empty repository and an empty home directory.
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(tmp.path().join("repo")).expect("create repo dir");
        std::fs::create_dir_all(tmp.path().join("home")).expect("create home dir");
        Self {
            sandbox: Sandbox { tmp },
        }
    }

    /// Add a file to the repository.
    pub fn repo_file(self, name: &str, contents: &str) -> Self {
        write(&self.sandbox.repo().join(name), contents);
        self
    }

    /// Add a directory to the repository.
    pub fn repo_dir(self, name: &str) -> Self {
        std::fs::create_dir_all(self.sandbox.repo().join(name)).expect("create repo subdir");
        self
    }

    /// Put a regular file in the home directory.
    pub fn home_file(self, name: &str, contents: &str) -> Self {
        write(&self.sandbox.home_path(name), contents);
        self
    }

    /// Put a symlink to `dest` in the home directory.
    #[cfg(unix)]
    pub fn home_symlink(self, name: &str, dest: &Path) -> Self {
        let link = self.sandbox.home_path(name);
        if let Some(parent) = link.parent() {
            std::fs::create_dir_all(parent).expect("create link parent");
        }
        std::os::unix::fs::symlink(dest, link).expect("create symlink");
        self
    }

    /// Finish building.
    pub fn build(self) -> Sandbox {
        self.sandbox
    }
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, contents).expect("write file");
}

/// A [`Log`] that keeps summary records in memory and drops messages.
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: Mutex<Vec<(String, LinkStatus)>>,
}

impl MemoryLog {
    /// Recorded `(name, status)` pairs in order.
    pub fn records(&self) -> Vec<(String, LinkStatus)> {
        self.records.lock().expect("lock records").clone()
    }
}

impl Log for MemoryLog {
    fn stage(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
    fn dry_run(&self, _msg: &str) {}

    fn record(&self, name: &str, status: LinkStatus, _message: Option<&str>) {
        self.records
            .lock()
            .expect("lock records")
            .push((name.to_string(), status));
    }
}
