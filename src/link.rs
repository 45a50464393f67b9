//! The link transaction: back up, replace, link, and record each dotfile.
//!
//! Linking is best effort per entry.  A failure on one entry is logged,
//! reported in the [`LinkReport`], and never stops the entries after it.
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{LinkError, StateError};
use crate::logging::{LinkStatus, Log};
use crate::operations::FileSystemOps;
use crate::resources::Applicable as _;
use crate::resources::symlink::SymlinkResource;
use crate::scan::DotfileEntry;
use crate::state::LinkRecord;

/// How to treat an entry whose target is already occupied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConflictResolution {
    /// Rename the existing object to `<target>.backup.<millis>` first.
    #[default]
    Backup,
    /// Leave the entry alone.
    Skip,
    /// Replace an existing symlink without a backup.
    ///
    /// Real files and directories are never deleted, so an overwrite onto
    /// one fails for that entry.
    Overwrite,
    /// Reserved.  Content merging is not supported; handled as [`Backup`](Self::Backup).
    Merge,
}

impl std::fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Backup => "backup",
            Self::Skip => "skip",
            Self::Overwrite => "overwrite",
            Self::Merge => "merge",
        };
        f.write_str(s)
    }
}

/// Resolutions keyed by entry name.  Entries without one are backed up.
pub type Resolutions = HashMap<String, ConflictResolution>;

/// Sink for successful links.
pub trait LinkRecorder {
    /// Persist `record`, ignoring it if its target is already recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored.
    fn record_link(&mut self, record: &LinkRecord) -> Result<(), StateError>;
}

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The symlink was created.
    Linked {
        /// Where the previous occupant was moved, if it was backed up.
        backup: Option<PathBuf>,
    },
    /// The entry was skipped by its resolution.
    Skipped,
    /// The entry could not be linked.
    Failed {
        /// Error message for the entry.
        reason: String,
    },
}

/// Per-entry result within a [`LinkReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    /// Entry name.
    pub name: String,
    /// Link target.
    pub target: PathBuf,
    /// Outcome.
    pub outcome: LinkOutcome,
}

/// Result of a link batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// One report per input entry, in input order.
    pub entries: Vec<EntryReport>,
    /// Number of entries that ended up linked.
    pub linked: usize,
}

impl LinkReport {
    /// Iterate over the failed entries.
    pub fn failures(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, LinkOutcome::Failed { .. }))
    }
}

/// Applies a batch of [`DotfileEntry`] values to the filesystem.
#[derive(Debug)]
pub struct Linker<'a> {
    fs: &'a dyn FileSystemOps,
    log: &'a dyn Log,
}

impl<'a> Linker<'a> {
    /// Create a linker over `fs` that logs through `log`.
    #[must_use]
    pub const fn new(fs: &'a dyn FileSystemOps, log: &'a dyn Log) -> Self {
        Self { fs, log }
    }

    /// Link every entry in order.
    ///
    /// `on_progress` is called with the running success count after each
    /// successful link.
    pub fn link_all(
        &self,
        entries: &[DotfileEntry],
        resolutions: &Resolutions,
        recorder: &mut dyn LinkRecorder,
        mut on_progress: impl FnMut(usize),
    ) -> LinkReport {
        let mut report = LinkReport::default();

        for entry in entries {
            let resolution = resolutions.get(&entry.name).copied().unwrap_or_default();

            let outcome = if resolution == ConflictResolution::Skip {
                self.log.debug(&format!("skipping {}", entry.name));
                self.log.record(&entry.name, LinkStatus::Skipped, None);
                LinkOutcome::Skipped
            } else {
                match self.link_one(entry, resolution, recorder) {
                    Ok(backup) => {
                        report.linked += 1;
                        on_progress(report.linked);
                        self.record_success(entry, backup.as_ref());
                        LinkOutcome::Linked { backup }
                    }
                    Err(e) => {
                        let reason = e.to_string();
                        self.log.error(&format!("{}: {reason}", entry.name));
                        self.log
                            .record(&entry.name, LinkStatus::Failed, Some(&reason));
                        LinkOutcome::Failed { reason }
                    }
                }
            };

            report.entries.push(EntryReport {
                name: entry.name.clone(),
                target: entry.target_path.clone(),
                outcome,
            });
        }

        report
    }

    fn link_one(
        &self,
        entry: &DotfileEntry,
        resolution: ConflictResolution,
        recorder: &mut dyn LinkRecorder,
    ) -> Result<Option<PathBuf>, LinkError> {
        let resource = SymlinkResource::new(
            entry.source_path.clone(),
            entry.target_path.clone(),
            self.fs,
        );

        let mut backup = None;
        if entry.has_conflict && entry.exists {
            match resolution {
                ConflictResolution::Merge | ConflictResolution::Backup => {
                    if resolution == ConflictResolution::Merge {
                        self.log.warn(&format!(
                            "merge is not supported, backing up {} instead",
                            entry.target_path.display()
                        ));
                    }
                    let millis = chrono::Utc::now().timestamp_millis();
                    let path = resource.back_up(millis).map_err(|e| LinkError::Backup {
                        target: entry.target_path.clone(),
                        message: e.to_string(),
                    })?;
                    self.log.debug(&format!(
                        "backed up {} to {}",
                        entry.target_path.display(),
                        path.display()
                    ));
                    backup = Some(path);
                }
                ConflictResolution::Overwrite | ConflictResolution::Skip => {}
            }
        }

        resource.apply().map_err(|e| LinkError::Symlink {
            target: entry.target_path.clone(),
            message: format!("{e:#}"),
        })?;
        self.log.debug(&format!("linked {}", resource.description()));

        recorder
            .record_link(&LinkRecord::symlink(
                entry.source_path.clone(),
                entry.target_path.clone(),
            ))
            .map_err(|e| LinkError::Record {
                target: entry.target_path.clone(),
                message: e.to_string(),
            })?;

        Ok(backup)
    }

    fn record_success(&self, entry: &DotfileEntry, backup: Option<&PathBuf>) {
        if entry.is_linked() {
            self.log.record(&entry.name, LinkStatus::AlreadyLinked, None);
            return;
        }
        let message = backup.map(|p| format!("backup: {}", p.display()));
        self.log
            .record(&entry.name, LinkStatus::Linked, message.as_deref());
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::test_helpers::MemoryRecorder;
    use super::*;
    use crate::logging::isolated_logger;
    use crate::operations::SystemFileSystemOps;
    use crate::operations::test_helpers::{FailingFileSystemOps, RecordingFileSystemOps};
    use crate::scan::scan;
    use std::path::Path;

    struct Fixture {
        _tmp: tempfile::TempDir,
        repo: PathBuf,
        home: PathBuf,
    }

    fn fixture(files: &[&str]) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let repo = tmp.path().join("dotfiles");
        let home = tmp.path().join("home");
        std::fs::create_dir_all(&repo).unwrap();
        std::fs::create_dir_all(&home).unwrap();
        for name in files {
            std::fs::write(repo.join(name), format!("repo {name}")).unwrap();
        }
        Fixture {
            _tmp: tmp,
            repo,
            home,
        }
    }

    fn entries(f: &Fixture) -> Vec<DotfileEntry> {
        scan(&SystemFileSystemOps, &f.repo, &f.home).unwrap().files
    }

    fn backups_of(target: &Path) -> Vec<PathBuf> {
        let prefix = format!(
            "{}.backup.",
            target.file_name().unwrap().to_string_lossy()
        );
        std::fs::read_dir(target.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with(&prefix))
            .collect()
    }

    #[test]
    fn links_fresh_home_and_reports_progress() {
        let (log, _logtmp, _guard) = isolated_logger();
        let f = fixture(&["vimrc", "zshrc"]);
        let mut recorder = MemoryRecorder::default();
        let mut progress = Vec::new();

        let report = Linker::new(&SystemFileSystemOps, &log).link_all(
            &entries(&f),
            &Resolutions::new(),
            &mut recorder,
            |n| progress.push(n),
        );

        assert_eq!(report.linked, 2);
        assert_eq!(progress, vec![1, 2]);
        assert_eq!(recorder.records.len(), 2);
        assert_eq!(
            std::fs::read_link(f.home.join(".vimrc")).unwrap(),
            f.repo.join("vimrc")
        );
    }

    #[test]
    fn second_scan_after_link_has_no_conflicts() {
        let (log, _logtmp, _guard) = isolated_logger();
        let f = fixture(&["vimrc", "gitconfig"]);
        std::fs::write(f.home.join(".vimrc"), "old").unwrap();
        let mut recorder = MemoryRecorder::default();

        Linker::new(&SystemFileSystemOps, &log).link_all(
            &entries(&f),
            &Resolutions::new(),
            &mut recorder,
            |_| {},
        );

        let rescan = scan(&SystemFileSystemOps, &f.repo, &f.home).unwrap();
        assert!(rescan.conflicts.is_empty());
        assert!(rescan.files.iter().all(DotfileEntry::is_linked));
    }

    #[test]
    fn backup_preserves_original_content() {
        let (log, _logtmp, _guard) = isolated_logger();
        let f = fixture(&["zshrc"]);
        let target = f.home.join(".zshrc");
        std::fs::write(&target, "precious").unwrap();
        let mut recorder = MemoryRecorder::default();

        let report = Linker::new(&SystemFileSystemOps, &log).link_all(
            &entries(&f),
            &Resolutions::new(),
            &mut recorder,
            |_| {},
        );

        let backups = backups_of(&target);
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read_to_string(&backups[0]).unwrap(), "precious");
        assert_eq!(
            report.entries[0].outcome,
            LinkOutcome::Linked {
                backup: Some(backups[0].clone())
            }
        );
        assert!(target.symlink_metadata().unwrap().file_type().is_symlink());
    }

    #[test]
    fn merge_is_handled_as_backup() {
        let (log, _logtmp, _guard) = isolated_logger();
        let f = fixture(&["bashrc"]);
        let target = f.home.join(".bashrc");
        std::fs::write(&target, "mine").unwrap();
        let resolutions = Resolutions::from([("bashrc".to_string(), ConflictResolution::Merge)]);

        let report = Linker::new(&SystemFileSystemOps, &log).link_all(
            &entries(&f),
            &resolutions,
            &mut MemoryRecorder::default(),
            |_| {},
        );

        assert_eq!(report.linked, 1);
        assert_eq!(backups_of(&target).len(), 1);
    }

    #[test]
    fn skip_performs_no_mutation_and_is_not_counted() {
        let (log, _logtmp, _guard) = isolated_logger();
        let f = fixture(&["vimrc", "zshrc"]);
        std::fs::write(f.home.join(".vimrc"), "keep").unwrap();
        let resolutions = Resolutions::from([("vimrc".to_string(), ConflictResolution::Skip)]);
        let fs = RecordingFileSystemOps::default();
        let mut recorder = MemoryRecorder::default();

        let report =
            Linker::new(&fs, &log).link_all(&entries(&f), &resolutions, &mut recorder, |_| {});

        assert_eq!(report.linked, 1);
        assert_eq!(report.entries[0].outcome, LinkOutcome::Skipped);
        assert!(
            fs.mutations().iter().all(|m| !m.contains(".vimrc")),
            "skip must not touch the target: {:?}",
            fs.mutations()
        );
        assert_eq!(std::fs::read_to_string(f.home.join(".vimrc")).unwrap(), "keep");
        assert_eq!(recorder.records.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_replaces_foreign_symlink_without_backup() {
        let (log, _logtmp, _guard) = isolated_logger();
        let f = fixture(&["vimrc"]);
        let target = f.home.join(".vimrc");
        std::os::unix::fs::symlink("/nonexistent/vimrc", &target).unwrap();
        let resolutions = Resolutions::from([("vimrc".to_string(), ConflictResolution::Overwrite)]);

        let report = Linker::new(&SystemFileSystemOps, &log).link_all(
            &entries(&f),
            &resolutions,
            &mut MemoryRecorder::default(),
            |_| {},
        );

        assert_eq!(report.linked, 1);
        assert!(backups_of(&target).is_empty());
        assert_eq!(std::fs::read_link(&target).unwrap(), f.repo.join("vimrc"));
    }

    #[test]
    fn overwrite_never_deletes_real_files() {
        let (log, _logtmp, _guard) = isolated_logger();
        let f = fixture(&["vimrc"]);
        let target = f.home.join(".vimrc");
        std::fs::write(&target, "precious").unwrap();
        let resolutions = Resolutions::from([("vimrc".to_string(), ConflictResolution::Overwrite)]);

        let report = Linker::new(&SystemFileSystemOps, &log).link_all(
            &entries(&f),
            &resolutions,
            &mut MemoryRecorder::default(),
            |_| {},
        );

        assert_eq!(report.linked, 0);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "precious");
    }

    #[test]
    fn one_failure_does_not_stop_the_batch() {
        let (log, _logtmp, _guard) = isolated_logger();
        let f = fixture(&["a_config", "b_config", "c_config", "d_config", "e_config"]);
        let fs = FailingFileSystemOps::failing_on(".c_config");
        let mut recorder = MemoryRecorder::default();
        let mut last = 0;

        let report = Linker::new(&fs, &log).link_all(
            &entries(&f),
            &Resolutions::new(),
            &mut recorder,
            |n| last = n,
        );

        assert_eq!(report.linked, 4);
        assert_eq!(last, 4);
        let failed: Vec<&str> = report.failures().map(|e| e.name.as_str()).collect();
        assert_eq!(failed, vec!["c_config"]);
        assert_eq!(recorder.records.len(), 4);
        assert_eq!(log.failure_count(), 1);
    }

    #[test]
    fn unwritable_parent_fails_only_that_entry() {
        let (log, _logtmp, _guard) = isolated_logger();
        let f = fixture(&["vimrc"]);
        std::fs::create_dir(f.repo.join("nvim")).unwrap();
        // A regular file where ~/.config should be blocks every ~/.config target.
        std::fs::write(f.home.join(".config"), "").unwrap();

        let report = Linker::new(&SystemFileSystemOps, &log).link_all(
            &entries(&f),
            &Resolutions::new(),
            &mut MemoryRecorder::default(),
            |_| {},
        );

        assert_eq!(report.linked, 1);
        let failed: Vec<&str> = report.failures().map(|e| e.name.as_str()).collect();
        assert_eq!(failed, vec!["nvim"]);
    }

    #[test]
    fn record_failure_marks_entry_failed() {
        struct Broken;
        impl LinkRecorder for Broken {
            fn record_link(&mut self, record: &LinkRecord) -> Result<(), StateError> {
                Err(StateError::Io {
                    path: record.target.clone(),
                    source: std::io::Error::other("disk full"),
                })
            }
        }

        let (log, _logtmp, _guard) = isolated_logger();
        let f = fixture(&["vimrc"]);
        let report = Linker::new(&SystemFileSystemOps, &log).link_all(
            &entries(&f),
            &Resolutions::new(),
            &mut Broken,
            |_| {},
        );

        assert_eq!(report.linked, 0);
        assert!(matches!(
            &report.entries[0].outcome,
            LinkOutcome::Failed { reason } if reason.contains("disk full")
        ));
    }

    #[test]
    fn relinking_correct_link_counts_as_already_linked() {
        let (log, _logtmp, _guard) = isolated_logger();
        let f = fixture(&["vimrc"]);
        let linker = Linker::new(&SystemFileSystemOps, &log);
        let mut recorder = MemoryRecorder::default();

        linker.link_all(&entries(&f), &Resolutions::new(), &mut recorder, |_| {});
        let report = linker.link_all(&entries(&f), &Resolutions::new(), &mut recorder, |_| {});

        assert_eq!(report.linked, 1);
        assert_eq!(recorder.records.len(), 1, "records are deduplicated by target");
        let statuses: Vec<LinkStatus> = log.entries().iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![LinkStatus::Linked, LinkStatus::AlreadyLinked]);
    }

    #[test]
    fn resolution_display_matches_names() {
        assert_eq!(ConflictResolution::Backup.to_string(), "backup");
        assert_eq!(ConflictResolution::default(), ConflictResolution::Backup);
    }
}
