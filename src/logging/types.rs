//! The [`Log`] trait and per-dotfile summary records.

/// Outcome of one dotfile, shown in the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Repository name of the dotfile.
    pub name: String,
    /// What happened to it.
    pub status: LinkStatus,
    /// Backup path, failure reason, and the like.
    pub message: Option<String>,
}

/// What happened to a dotfile during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// A new symlink was created.
    Linked,
    /// The symlink already pointed at the repository copy and was refreshed.
    AlreadyLinked,
    /// The entry was skipped by the chosen conflict resolution.
    Skipped,
    /// Dry run; the link would have been created.
    DryRun,
    /// The entry could not be linked.
    Failed,
}

impl LinkStatus {
    pub(super) const fn marker(self) -> (&'static str, &'static str) {
        match self {
            Self::Linked => ("✓", "\x1b[32m"),
            Self::AlreadyLinked => ("·", "\x1b[2m"),
            Self::Skipped => ("○", "\x1b[33m"),
            Self::DryRun => ("~", "\x1b[37m"),
            Self::Failed => ("✗", "\x1b[31m"),
        }
    }
}

/// Logging as seen by the scan-and-link engine.
pub trait Log: Send + Sync + std::fmt::Debug {
    /// Section header.
    fn stage(&self, msg: &str);
    /// Normal progress line.
    fn info(&self, msg: &str);
    /// Detail that reaches the console only with `--verbose`.
    fn debug(&self, msg: &str);
    /// Something went wrong but the run continues.
    fn warn(&self, msg: &str);
    /// Something failed.
    fn error(&self, msg: &str);
    /// An action a dry run skipped.
    fn dry_run(&self, msg: &str);
    /// Add a dotfile outcome to the summary.
    fn record(&self, name: &str, status: LinkStatus, message: Option<&str>);
}
