//! File-system resource helpers.
use std::path::{Path, PathBuf};

use crate::operations::FileSystemOps;
use crate::resources::error::ResourceError;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(fs: &dyn FileSystemOps, path: &Path) -> Result<(), ResourceError> {
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)
            .map_err(|e| ResourceError::io("create parent", parent, e))?;
    }
    Ok(())
}

/// Return the sibling path an existing target is renamed to before linking:
/// `<target>.backup.<millis>`.
#[must_use]
pub fn backup_path(target: &Path, millis: i64) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(format!(".backup.{millis}"));
    PathBuf::from(name)
}
