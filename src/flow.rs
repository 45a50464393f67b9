//! The interactive link flow shared by `nvs init` and `nvs add`.
//!
//! ```text
//! resolving-source ─┬─> scanning ─┬─> resolving-conflicts* ─> preview ─> linking ─> done
//!                   └─> cloning ──┘                              └─> aborted
//! ```
//!
//! [`Step::next`] is the only way to move between steps.  `error` is reachable
//! from source resolution, cloning, and scanning; once linking has started the
//! flow always ends in `done`.
use crate::error::FlowError;

/// Where the flow currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Choosing a local directory or a repository to clone.
    ResolvingSource,
    /// Cloning the chosen repository.
    Cloning,
    /// Classifying and scanning the source directory.
    Scanning,
    /// Asking how to treat conflict `current` (zero-based) of `total`.
    ResolvingConflicts {
        /// Index of the conflict being resolved.
        current: usize,
        /// Number of conflicts.
        total: usize,
    },
    /// Showing the entries and waiting for confirmation.
    Preview,
    /// Applying the links.
    Linking,
    /// Finished.
    Done {
        /// Entries linked successfully.
        linked: usize,
    },
    /// The user declined.
    Aborted,
    /// A fatal error ended the flow.
    Error(String),
}

/// Something that happened while in a [`Step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A local source directory is ready to scan.
    SourceReady,
    /// The source is a repository that has to be cloned first.
    CloneRequired,
    /// The clone succeeded.
    CloneFinished,
    /// The clone failed.
    CloneFailed(String),
    /// The clone was not performed (dry run), so there is nothing to scan.
    CloneSkipped,
    /// The requested source cannot be used.
    InvalidSource(String),
    /// The scan completed.
    ScanFinished {
        /// Number of candidates.
        files: usize,
        /// Number of candidates with a conflict.
        conflicts: usize,
    },
    /// The scan failed.  A recoverable failure returns to source selection.
    ScanFailed {
        /// Error message.
        message: String,
        /// Whether another source may be chosen.
        recoverable: bool,
    },
    /// The current conflict has a resolution.
    ConflictResolved,
    /// The user confirmed linking.
    Confirmed,
    /// The user declined or cancelled a prompt.
    Declined,
    /// Linking completed.
    LinkFinished {
        /// Entries linked successfully.
        linked: usize,
    },
}

impl Step {
    /// Return `true` for `done`, `aborted`, and `error`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Aborted | Self::Error(_))
    }

    /// Short name used in error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ResolvingSource => "resolving source",
            Self::Cloning => "cloning",
            Self::Scanning => "scanning",
            Self::ResolvingConflicts { .. } => "resolving conflicts",
            Self::Preview => "previewing",
            Self::Linking => "linking",
            Self::Done { .. } => "done",
            Self::Aborted => "aborted",
            Self::Error(_) => "failed",
        }
    }

    /// Apply `event` to this step.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidTransition`] if `event` cannot happen in
    /// this step.
    pub fn next(self, event: Event) -> Result<Self, FlowError> {
        let step = match (&self, event) {
            (Self::ResolvingSource, Event::SourceReady) | (Self::Cloning, Event::CloneFinished) => {
                Self::Scanning
            }
            (Self::ResolvingSource, Event::CloneRequired) => Self::Cloning,
            (Self::ResolvingSource, Event::InvalidSource(message))
            | (Self::Cloning, Event::CloneFailed(message))
            | (
                Self::Scanning,
                Event::ScanFailed {
                    message,
                    recoverable: false,
                },
            ) => Self::Error(message),
            (
                Self::Scanning,
                Event::ScanFailed {
                    recoverable: true, ..
                },
            ) => Self::ResolvingSource,
            (Self::Cloning, Event::CloneSkipped)
            | (Self::Scanning, Event::ScanFinished { files: 0, .. }) => Self::Done { linked: 0 },
            (Self::Scanning, Event::ScanFinished { conflicts: 0, .. }) => Self::Preview,
            (Self::Scanning, Event::ScanFinished { conflicts, .. }) => Self::ResolvingConflicts {
                current: 0,
                total: conflicts,
            },
            (Self::ResolvingConflicts { current, total }, Event::ConflictResolved) => {
                if current + 1 < *total {
                    Self::ResolvingConflicts {
                        current: current + 1,
                        total: *total,
                    }
                } else {
                    Self::Preview
                }
            }
            (Self::Preview, Event::Confirmed) => Self::Linking,
            (
                Self::ResolvingSource | Self::ResolvingConflicts { .. } | Self::Preview,
                Event::Declined,
            ) => Self::Aborted,
            (Self::Linking, Event::LinkFinished { linked }) => Self::Done { linked },
            (_, event) => {
                return Err(FlowError::InvalidTransition {
                    step: self.name().to_string(),
                    event: event.name().to_string(),
                });
            }
        };
        tracing::debug!("flow: {} -> {}", self.name(), step.name());
        Ok(step)
    }
}

impl Event {
    const fn name(&self) -> &'static str {
        match self {
            Self::SourceReady => "source-ready",
            Self::CloneRequired => "clone-required",
            Self::CloneFinished => "clone-finished",
            Self::CloneFailed(_) => "clone-failed",
            Self::CloneSkipped => "clone-skipped",
            Self::InvalidSource(_) => "invalid-source",
            Self::ScanFinished { .. } => "scan-finished",
            Self::ScanFailed { .. } => "scan-failed",
            Self::ConflictResolved => "conflict-resolved",
            Self::Confirmed => "confirmed",
            Self::Declined => "declined",
            Self::LinkFinished { .. } => "link-finished",
        }
    }
}
