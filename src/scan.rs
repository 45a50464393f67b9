//! Conflict scanning: annotate candidates with the live state of their targets.
use std::path::{Path, PathBuf};

use crate::classify::{self, Candidate};
use crate::error::ScanError;
use crate::operations::FileSystemOps;
use crate::resources::symlink::SymlinkResource;
use crate::resources::{Resource as _, ResourceState};

/// A candidate dotfile together with the state of its target at scan time.
///
/// Rebuilt on every scan; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotfileEntry {
    /// Raw entry name in the repository.
    pub name: String,
    /// Absolute path inside the repository.
    pub source_path: PathBuf,
    /// Absolute path the entry is linked to.
    pub target_path: PathBuf,
    /// Something exists at the target.
    pub exists: bool,
    /// The target is a symlink.
    pub is_symlink: bool,
    /// The target is occupied by something other than the desired link.
    pub has_conflict: bool,
}

impl DotfileEntry {
    /// Return `true` if the target already is the desired link.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        self.is_symlink && !self.has_conflict
    }

    fn from_state(candidate: Candidate, state: &ResourceState) -> Self {
        Self {
            name: candidate.name,
            source_path: candidate.source_path,
            target_path: candidate.target_path,
            exists: state.exists(),
            is_symlink: matches!(
                state,
                ResourceState::Correct | ResourceState::Incorrect { .. }
            ),
            has_conflict: state.is_conflict(),
        }
    }
}

/// Every candidate found by a scan, plus the conflicting subset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// All candidates in name order.
    pub files: Vec<DotfileEntry>,
    /// Entries with `has_conflict` set, in the same order.
    pub conflicts: Vec<DotfileEntry>,
}

/// Scan `dir` for dotfiles and compare each target under `home` with the
/// link it should be.
///
/// The scan never mutates the filesystem.  A target that cannot be
/// inspected is reported as absent; linking it will surface the real error.
///
/// # Errors
///
/// Returns [`ScanError::Unreadable`] if `dir` cannot be listed.
pub fn scan(fs: &dyn FileSystemOps, dir: &Path, home: &Path) -> Result<ScanResult, ScanError> {
    let candidates = classify::classify_dir(fs, dir, home)?;

    let files: Vec<DotfileEntry> = candidates
        .into_iter()
        .map(|candidate| {
            let resource = SymlinkResource::new(
                candidate.source_path.clone(),
                candidate.target_path.clone(),
                fs,
            );
            let state = resource.current_state().unwrap_or_else(|e| {
                tracing::debug!("cannot inspect {}: {e:#}", candidate.target_path.display());
                ResourceState::Missing
            });
            DotfileEntry::from_state(candidate, &state)
        })
        .collect();

    let conflicts = files.iter().filter(|f| f.has_conflict).cloned().collect();

    Ok(ScanResult { files, conflicts })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::operations::SystemFileSystemOps;

    struct Fixture {
        _tmp: tempfile::TempDir,
        repo: PathBuf,
        home: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let repo = tmp.path().join("dotfiles");
        let home = tmp.path().join("home");
        std::fs::create_dir_all(&repo).unwrap();
        std::fs::create_dir_all(&home).unwrap();
        Fixture {
            _tmp: tmp,
            repo,
            home,
        }
    }

    #[test]
    fn fresh_home_has_no_conflicts() {
        let f = fixture();
        std::fs::write(f.repo.join("vimrc"), "").unwrap();
        std::fs::create_dir(f.repo.join("nvim")).unwrap();

        let result = scan(&SystemFileSystemOps, &f.repo, &f.home).unwrap();
        assert_eq!(result.files.len(), 2);
        assert!(result.conflicts.is_empty());
        assert!(result.files.iter().all(|e| !e.exists && !e.is_symlink));
    }

    #[test]
    fn regular_file_conflicts_even_with_identical_content() {
        let f = fixture();
        std::fs::write(f.repo.join("vimrc"), "set nu").unwrap();
        std::fs::write(f.home.join(".vimrc"), "set nu").unwrap();

        let result = scan(&SystemFileSystemOps, &f.repo, &f.home).unwrap();
        let entry = &result.conflicts[0];
        assert_eq!(entry.name, "vimrc");
        assert!(entry.exists);
        assert!(!entry.is_symlink);
        assert!(entry.has_conflict);
    }

    #[cfg(unix)]
    #[test]
    fn correct_link_is_not_a_conflict() {
        let f = fixture();
        let source = f.repo.join(".zshrc");
        std::fs::write(&source, "").unwrap();
        std::os::unix::fs::symlink(&source, f.home.join(".zshrc")).unwrap();

        let result = scan(&SystemFileSystemOps, &f.repo, &f.home).unwrap();
        assert!(result.conflicts.is_empty());
        assert!(result.files[0].is_linked());
    }

    #[cfg(unix)]
    #[test]
    fn foreign_and_broken_links_conflict() {
        let f = fixture();
        std::fs::write(f.repo.join(".bashrc"), "").unwrap();
        std::fs::write(f.repo.join(".zshrc"), "").unwrap();
        std::os::unix::fs::symlink("/etc/hostname", f.home.join(".bashrc")).unwrap();
        std::os::unix::fs::symlink("/nonexistent", f.home.join(".zshrc")).unwrap();

        let result = scan(&SystemFileSystemOps, &f.repo, &f.home).unwrap();
        assert_eq!(result.conflicts.len(), 2);
        assert!(result.conflicts.iter().all(|e| e.is_symlink && e.exists));
    }

    #[test]
    fn conflicts_keep_scan_order() {
        let f = fixture();
        for name in ["zshrc", "bashrc", "vimrc"] {
            std::fs::write(f.repo.join(name), "").unwrap();
            std::fs::write(f.home.join(format!(".{name}")), "").unwrap();
        }

        let result = scan(&SystemFileSystemOps, &f.repo, &f.home).unwrap();
        let names: Vec<&str> = result.conflicts.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["bashrc", "vimrc", "zshrc"]);
    }

    #[test]
    fn scan_is_repeatable() {
        let f = fixture();
        std::fs::write(f.repo.join("gitconfig"), "").unwrap();
        std::fs::write(f.home.join(".gitconfig"), "").unwrap();

        let first = scan(&SystemFileSystemOps, &f.repo, &f.home).unwrap();
        let second = scan(&SystemFileSystemOps, &f.repo, &f.home).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unreadable_directory_is_an_error() {
        let f = fixture();
        let err = scan(&SystemFileSystemOps, &f.repo.join("missing"), &f.home).unwrap_err();
        assert!(matches!(err, ScanError::Unreadable { .. }));
    }
}
