//! Typed error variants for resource operations.
//!
//! This module provides [`ResourceError`], a structured error type for
//! resource check and apply operations.  Resource code returns these
//! variants; callers convert to [`anyhow::Error`] via `?`.

use thiserror::Error;

/// Errors that arise from resource checks and apply operations.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// A non-symlink object occupies a path that should become a symlink.
    #[error("target is occupied by a {kind}: {path}")]
    Occupied {
        /// Path of the occupied target.
        path: String,
        /// What occupies it (`"file"` or `"directory"`).
        kind: String,
    },

    /// A filesystem primitive failed.
    #[error("{operation} {path}: {source}")]
    Io {
        /// Short name of the failed operation (e.g. `"create link"`).
        operation: String,
        /// Path the operation was applied to.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl ResourceError {
    /// Wrap an I/O error with the operation and path that produced it.
    #[must_use]
    pub fn io(operation: &str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.to_string(),
            path: path.display().to_string(),
            source,
        }
    }
}
