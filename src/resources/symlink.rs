//! Symlink resource.
use anyhow::Result;
use std::io;
use std::path::{Path, PathBuf};

use super::error::ResourceError;
use super::helpers::fs::{backup_path, ensure_parent_dir};
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::operations::{EntryKind, FileSystemOps};

/// A symlink `target -> source` that can be checked, applied, and removed.
#[derive(Debug, Clone)]
pub struct SymlinkResource<'a> {
    /// The file or directory inside the dotfiles repository.
    pub source: PathBuf,
    /// Where the symlink lives under the home directory.
    pub target: PathBuf,
    fs: &'a dyn FileSystemOps,
}

impl<'a> SymlinkResource<'a> {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf, fs: &'a dyn FileSystemOps) -> Self {
        Self { source, target, fs }
    }

    /// Move whatever occupies the target to `<target>.backup.<millis>`.
    ///
    /// Returns the backup path.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    pub fn back_up(&self, millis: i64) -> Result<PathBuf, ResourceError> {
        let backup = backup_path(&self.target, millis);
        self.fs
            .rename(&self.target, &backup)
            .map_err(|e| ResourceError::io("back up", &self.target, e))?;
        Ok(backup)
    }

    fn target_kind(&self) -> Result<Option<EntryKind>, ResourceError> {
        match self.fs.lstat(&self.target) {
            Ok(kind) => Ok(Some(kind)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ResourceError::io("inspect", &self.target, e)),
        }
    }
}

impl Applicable for SymlinkResource<'_> {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    /// Replace any symlink at the target with one pointing at the source.
    ///
    /// Real files and directories are never removed here; they must be
    /// backed up first or the apply fails with [`ResourceError::Occupied`].
    fn apply(&self) -> Result<ResourceChange> {
        ensure_parent_dir(self.fs, &self.target)?;

        match self.target_kind()? {
            Some(EntryKind::Symlink) => self
                .fs
                .remove_symlink(&self.target)
                .map_err(|e| ResourceError::io("remove existing link", &self.target, e))?,
            Some(kind @ (EntryKind::File | EntryKind::Dir)) => {
                return Err(ResourceError::Occupied {
                    path: self.target.display().to_string(),
                    kind: kind_name(kind).to_string(),
                }
                .into());
            }
            None => {}
        }

        self.fs
            .symlink(&self.source, &self.target)
            .map_err(|e| ResourceError::io("create link", &self.target, e))?;

        Ok(ResourceChange::Applied)
    }

    /// Remove the target if, and only if, it is a symlink.
    fn remove(&self) -> Result<ResourceChange> {
        match self.target_kind()? {
            Some(EntryKind::Symlink) => {
                self.fs
                    .remove_symlink(&self.target)
                    .map_err(|e| ResourceError::io("remove link", &self.target, e))?;
                Ok(ResourceChange::Applied)
            }
            Some(kind) => Ok(ResourceChange::Skipped {
                reason: format!("not a symlink ({})", kind_name(kind)),
            }),
            None => Ok(ResourceChange::Skipped {
                reason: "does not exist".to_string(),
            }),
        }
    }
}

impl Resource for SymlinkResource<'_> {
    /// Compare the target against the desired link.
    ///
    /// The stored link destination is compared textually with the source:
    /// relative links and links through other symlinks count as different
    /// even when they resolve to the same file.
    fn current_state(&self) -> Result<ResourceState> {
        let state = match self.target_kind()? {
            None => ResourceState::Missing,
            Some(EntryKind::Symlink) => {
                let existing = self
                    .fs
                    .read_link(&self.target)
                    .map_err(|e| ResourceError::io("read link", &self.target, e))?;
                if paths_equal(&existing, &self.source) {
                    ResourceState::Correct
                } else {
                    ResourceState::Incorrect {
                        current: format!("points to {}", existing.display()),
                    }
                }
            }
            Some(kind) => ResourceState::Invalid {
                reason: format!("occupied by a {}", kind_name(kind)),
            },
        };
        Ok(state)
    }
}

const fn kind_name(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Dir => "directory",
        EntryKind::File => "file",
        EntryKind::Symlink => "symlink",
    }
}

/// Compare two paths for equality, handling UNC prefix normalization on Windows.
fn paths_equal(a: &Path, b: &Path) -> bool {
    let normalize = |p: &Path| -> PathBuf {
        #[cfg(windows)]
        {
            let s = p.to_string_lossy();
            if let Some(stripped) = s.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
        }
        p.to_path_buf()
    };

    normalize(a) == normalize(b)
}
