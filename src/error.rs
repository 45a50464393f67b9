//! Domain-specific error types for the scan-and-link engine.
//!
//! Internal modules return typed errors (e.g., [`ScanError`], [`StateError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! NvsError
//! ├── Source(SourceError)  repository parsing and cloning
//! ├── Scan(ScanError)      dotfiles directory listing
//! ├── Link(LinkError)      per-entry link failures
//! ├── State(StateError)    ~/.nvs/config.json persistence
//! └── Flow(FlowError)      invalid flow transitions
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for nvs.
#[derive(Error, Debug)]
pub enum NvsError {
    /// Source resolution error.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Scan error.
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Link error for a single entry.
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// Persisted state error.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Flow state machine error.
    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

/// Errors that arise while resolving the dotfiles source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The argument is neither `owner/repo` nor a GitHub URL.
    #[error("Invalid repository: {0} (expected owner/repo or a GitHub URL)")]
    InvalidRepository(String),

    /// `git clone` failed.
    #[error("Failed to clone {url}: {message}")]
    CloneFailed {
        /// URL that was being cloned.
        url: String,
        /// Message reported by git.
        message: String,
    },

    /// A local dotfiles directory does not exist or is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Errors that arise while scanning a dotfiles directory.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The directory could not be listed.
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        /// Directory that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while linking a single dotfile.
///
/// These never abort a batch; the linker records them per entry.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The existing target could not be renamed out of the way.
    #[error("backup {target}: {message}")]
    Backup {
        /// Target that should have been backed up.
        target: PathBuf,
        /// Underlying failure.
        message: String,
    },

    /// The symlink could not be created.
    #[error("link {target}: {message}")]
    Symlink {
        /// Target of the failed link.
        target: PathBuf,
        /// Underlying failure.
        message: String,
    },

    /// The link record could not be persisted.
    #[error("record {target}: {message}")]
    Record {
        /// Target whose record could not be written.
        target: PathBuf,
        /// Underlying failure.
        message: String,
    },
}

/// Errors that arise from the persisted state file.
#[derive(Error, Debug)]
pub enum StateError {
    /// The state file could not be read or written.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path to the state file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The state file exists but is not valid JSON for the expected shape.
    #[error("Malformed state file {path}: {source}")]
    Parse {
        /// Path to the state file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Errors raised by the flow state machine.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlowError {
    /// An event arrived that the current step does not accept.
    #[error("Unexpected {event} while {step}")]
    InvalidTransition {
        /// Step the flow was in.
        step: String,
        /// Event that was rejected.
        event: String,
    },
}
