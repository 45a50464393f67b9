//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that the scanner and linker can be
//! unit-tested with injected failures.  Production code uses
//! [`SystemFileSystemOps`].

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Kind of object found at a path without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A symbolic link (possibly broken).
    Symlink,
    /// A real directory.
    Dir,
    /// A regular file or any other non-directory object.
    File,
}

/// Abstraction over the filesystem primitives used by the engine.
///
/// The production implementation is [`SystemFileSystemOps`].
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` is a directory, following symlinks.
    ///
    /// Any error while inspecting `path` is reported as `false`.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns the raw names of the immediate children of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or read as a directory.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<OsString>>;

    /// Inspect `path` without following symlinks.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::NotFound`] when nothing exists at `path`,
    /// or any other error when it cannot be inspected.
    fn lstat(&self, path: &Path) -> io::Result<EntryKind>;

    /// Read the stored destination of the symbolic link at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a symlink or cannot be read.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Rename `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create `path` and all missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove the symlink at `path` without touching what it points to.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    fn remove_symlink(&self, path: &Path) -> io::Result<()>;

    /// Create a symlink at `link` pointing to `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be created.
    fn symlink(&self, source: &Path, link: &Path) -> io::Result<()>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        std::fs::read_dir(path)?
            .map(|e| e.map(|entry| entry.file_name()))
            .collect()
    }

    fn lstat(&self, path: &Path) -> io::Result<EntryKind> {
        let meta = std::fs::symlink_metadata(path)?;
        Ok(if meta.file_type().is_symlink() {
            EntryKind::Symlink
        } else if meta.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_symlink(&self, path: &Path) -> io::Result<()> {
        let meta = std::fs::symlink_metadata(path)?;
        if is_dir_like(&meta) {
            std::fs::remove_dir(path)
        } else {
            std::fs::remove_file(path)
        }
    }

    fn symlink(&self, source: &Path, link: &Path) -> io::Result<()> {
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(source, link)
        }

        #[cfg(windows)]
        {
            if source.is_dir() {
                std::os::windows::fs::symlink_dir(source, link)
            } else {
                std::os::windows::fs::symlink_file(source, link)
            }
        }
    }
}

/// Check if metadata represents a directory-like entry.
///
/// On Windows, `symlink_metadata().is_dir()` returns `false` for directory
/// symlinks, which must nevertheless be removed with `remove_dir`, so the raw
/// `FILE_ATTRIBUTE_DIRECTORY` bit is checked instead.
fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn list_dir_returns_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vimrc"), "").unwrap();
        std::fs::create_dir(dir.path().join("nvim")).unwrap();
        let mut names = SystemFileSystemOps.list_dir(dir.path()).unwrap();
        names.sort();
        assert_eq!(names, vec![OsString::from("nvim"), OsString::from("vimrc")]);
    }

    #[test]
    fn lstat_reports_missing_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = SystemFileSystemOps
            .lstat(&dir.path().join("absent"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn lstat_distinguishes_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        assert_eq!(
            SystemFileSystemOps.lstat(&dir.path().join("file")).unwrap(),
            EntryKind::File
        );
        assert_eq!(
            SystemFileSystemOps.lstat(&dir.path().join("sub")).unwrap(),
            EntryKind::Dir
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlink_roundtrip_keeps_stored_destination() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("link");
        SystemFileSystemOps
            .symlink(Path::new("relative/target"), &link)
            .unwrap();
        assert_eq!(SystemFileSystemOps.lstat(&link).unwrap(), EntryKind::Symlink);
        assert_eq!(
            SystemFileSystemOps.read_link(&link).unwrap(),
            PathBuf::from("relative/target")
        );
        SystemFileSystemOps.remove_symlink(&link).unwrap();
        assert!(link.symlink_metadata().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn remove_symlink_leaves_directory_destination_intact() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        std::fs::write(real.join("init.lua"), "x").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        SystemFileSystemOps.remove_symlink(&link).unwrap();
        assert!(real.join("init.lua").exists());
    }

    #[test]
    fn failing_ops_reject_matching_paths() {
        let dir = tempfile::tempdir().unwrap();
        let fs = test_helpers::FailingFileSystemOps::failing_on(".bad");
        let err = fs
            .symlink(dir.path(), &dir.path().join(".bad"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
