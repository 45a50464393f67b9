//! Filesystem objects nvs manages: inspect first, then change.
//!
//! [`symlink::SymlinkResource`] is the only resource. The scanner reads its
//! [`ResourceState`]; the linker and `unlink` go through [`Applicable`].
pub mod error;
pub mod symlink;

/// Path helpers shared by resources.
pub mod helpers {
    pub mod fs;
}

use anyhow::Result;

/// A change that can be made and undone.
pub trait Applicable {
    /// `target -> source` style label for logs.
    fn description(&self) -> String;

    /// Bring the object to its desired state, creating parents as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is occupied or a filesystem call fails.
    fn apply(&self) -> Result<ResourceChange>;

    /// Undo [`Applicable::apply`].
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    fn remove(&self) -> Result<ResourceChange>;
}

/// A resource whose live state can be inspected.
pub trait Resource: Applicable {
    /// Inspect the filesystem without changing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be inspected.
    fn current_state(&self) -> Result<ResourceState>;
}

/// What currently sits where the resource should be.
///
/// ```
/// use nvs_cli::resources::ResourceState;
///
/// let foreign = ResourceState::Invalid { reason: "occupied by a file".into() };
/// assert!(foreign.is_conflict());
/// assert!(!ResourceState::Correct.is_conflict());
/// assert!(!ResourceState::Missing.exists());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Nothing is there.
    Missing,
    /// Exactly the desired object is there.
    Correct,
    /// The same kind of object, pointing elsewhere.
    Incorrect {
        /// What it currently is, for display.
        current: String,
    },
    /// A different kind of object is in the way.
    Invalid {
        /// What is in the way.
        reason: String,
    },
}

impl ResourceState {
    /// Whether applying would displace something.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Incorrect { .. } | Self::Invalid { .. })
    }

    /// Whether anything occupies the target.
    #[must_use]
    pub const fn exists(&self) -> bool {
        !matches!(self, Self::Missing)
    }
}

/// Outcome of [`Applicable::apply`] or [`Applicable::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// The filesystem was changed.
    Applied,
    /// Nothing was done.
    Skipped {
        /// Why, e.g. the target is not a symlink.
        reason: String,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn missing_is_neither_conflict_nor_existing() {
        assert!(!ResourceState::Missing.is_conflict());
        assert!(!ResourceState::Missing.exists());
    }

    #[test]
    fn correct_exists_without_conflict() {
        assert!(!ResourceState::Correct.is_conflict());
        assert!(ResourceState::Correct.exists());
    }

    #[test]
    fn incorrect_and_invalid_conflict() {
        let wrong = ResourceState::Incorrect {
            current: "points to /elsewhere".to_string(),
        };
        let occupied = ResourceState::Invalid {
            reason: "occupied by a file".to_string(),
        };
        assert!(wrong.is_conflict() && wrong.exists());
        assert!(occupied.is_conflict() && occupied.exists());
    }
}
