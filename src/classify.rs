//! Dotfile classification and target-path mapping.
//!
//! Decides which names in a dotfiles repository are installable and where
//! each one lands under the home directory.  Everything here is a pure
//! function of the entry name (plus the home directory for mapping); the only
//! I/O lives in [`classify_dir`], which lists the repository.
use std::path::{Path, PathBuf};

use crate::error::ScanError;
use crate::operations::FileSystemOps;

/// Names excluded verbatim.
const IGNORE_EXACT: &[&str] = &[
    ".git",
    ".github",
    ".DS_Store",
    "node_modules",
    "install.sh",
    "setup.sh",
    "Makefile",
];

/// Names excluded regardless of case.
const IGNORE_EXACT_NOCASE: &[&str] = &["CLAUDE.md"];

/// Name prefixes excluded regardless of case (`README.md`, `LICENSE-MIT`, ...).
const IGNORE_PREFIX_NOCASE: &[&str] = &["README", "LICENSE"];

/// Tools whose configuration lives under `~/.config/` rather than `~/`.
///
/// Matched against the name with one leading dot stripped, case-sensitively.
pub const CONFIG_DIR_TOOLS: &[&str] = &[
    "alacritty",
    "ghostty",
    "kitty",
    "nvim",
    "starship.toml",
    "wezterm",
];

/// A repository entry accepted by the classifier, before conflict scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Raw entry name as it appears in the repository.
    pub name: String,
    /// Absolute path of the entry inside the repository.
    pub source_path: PathBuf,
    /// Absolute path the entry should be linked to.
    pub target_path: PathBuf,
}

/// Return `true` if `name` is excluded by an ignore rule.
///
/// Ignore rules take precedence over every inclusion rule.
#[must_use]
pub fn should_ignore(name: &str) -> bool {
    IGNORE_EXACT.contains(&name)
        || IGNORE_EXACT_NOCASE
            .iter()
            .any(|ignored| name.eq_ignore_ascii_case(ignored))
        || IGNORE_PREFIX_NOCASE
            .iter()
            .any(|prefix| starts_with_ignore_case(name, prefix))
}

/// Return `true` if `name` looks like a dotfile.
///
/// Matches a leading dot followed by a letter (`.zshrc`), an `rc` suffix
/// (`vimrc`), or `config` anywhere in the name, ignoring case
/// (`gitconfig`, `Config.fish`).
#[must_use]
pub fn is_dotfile_name(name: &str) -> bool {
    let dot_letter = name
        .strip_prefix('.')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_alphabetic());

    dot_letter || name.ends_with("rc") || name.to_ascii_lowercase().contains("config")
}

/// Decide whether an entry is a candidate.
///
/// Directories bypass the name patterns so that config folders with plain
/// names (`nvim`, `git`) are picked up, but never bypass the ignore rules.
#[must_use]
pub fn is_candidate(name: &str, is_dir: bool) -> bool {
    !should_ignore(name) && (is_dir || is_dotfile_name(name))
}

/// Compute where `name` should be linked under `home`.
///
/// Names of known `~/.config` tools map to `<home>/.config/<bare name>`;
/// everything else maps to `<home>/.<bare name>`.  Performs no filesystem
/// access.
///
/// # Examples
///
/// ```
/// use nvs_cli::classify::target_path;
/// use std::path::{Path, PathBuf};
///
/// let home = Path::new("/home/user");
/// assert_eq!(target_path(home, "vimrc"), PathBuf::from("/home/user/.vimrc"));
/// assert_eq!(target_path(home, ".zshrc"), PathBuf::from("/home/user/.zshrc"));
/// assert_eq!(target_path(home, "nvim"), PathBuf::from("/home/user/.config/nvim"));
/// ```
#[must_use]
pub fn target_path(home: &Path, name: &str) -> PathBuf {
    let bare = name.strip_prefix('.').unwrap_or(name);
    if CONFIG_DIR_TOOLS.contains(&bare) {
        return home.join(".config").join(bare);
    }
    home.join(format!(".{bare}"))
}

/// List `dir` and return its candidates, sorted by name.
///
/// An entry whose type cannot be determined (for example a broken symlink
/// inside the repository) is treated as a regular file, so it is kept only
/// when its name matches a dotfile pattern. Names that are not valid UTF-8
/// are skipped with a warning.
///
/// # Errors
///
/// Returns [`ScanError::Unreadable`] if `dir` cannot be listed.
pub fn classify_dir(
    fs: &dyn FileSystemOps,
    dir: &Path,
    home: &Path,
) -> Result<Vec<Candidate>, ScanError> {
    let mut names: Vec<String> = fs
        .list_dir(dir)
        .map_err(|source| ScanError::Unreadable {
            path: dir.to_path_buf(),
            source,
        })?
        .into_iter()
        .filter_map(|raw| {
            raw.into_string()
                .map_err(|raw| tracing::warn!("skipping non-UTF-8 name: {}", raw.display()))
                .ok()
        })
        .collect();
    names.sort();

    let candidates = names
        .into_iter()
        .filter(|name| !should_ignore(name))
        .filter_map(|name| {
            let source_path = dir.join(&name);
            let is_dir = fs.is_dir(&source_path);
            if !is_candidate(&name, is_dir) {
                tracing::debug!("not a dotfile: {name}");
                return None;
            }
            let target_path = target_path(home, &name);
            Some(Candidate {
                name,
                source_path,
                target_path,
            })
        })
        .collect();

    Ok(candidates)
}

fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    name.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
