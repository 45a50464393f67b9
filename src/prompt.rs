//! Interactive prompts behind the [`Prompter`] trait.
//!
//! [`InquirePrompter`] asks on the terminal; [`AutoPrompter`] answers every
//! question with its default for `--yes` runs.  A cancelled prompt (Esc or
//! Ctrl-C) is `Ok(None)` so the flow can end as aborted rather than failed.
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use inquire::{Confirm, InquireError, Select, Text};

use crate::link::ConflictResolution;
use crate::scan::DotfileEntry;

/// Where `nvs init` should take its dotfiles from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceChoice {
    /// The detected directory.
    UseExisting(PathBuf),
    /// A directory typed by the user.
    CustomPath,
    /// A GitHub repository to clone.
    CloneFromGitHub,
}

/// Questions asked during the link flow.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter {
    /// Choose a source, offering `detected` first when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be used.
    fn choose_source<'a>(&self, detected: Option<&'a Path>) -> Result<Option<SourceChoice>>;

    /// Ask for a dotfiles directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be used.
    fn input_path(&self) -> Result<Option<String>>;

    /// Ask for `owner/repo` or a GitHub URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be used.
    fn input_repo(&self) -> Result<Option<String>>;

    /// Ask how to treat conflict `index` (zero-based) of `total`.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be used.
    fn resolve_conflict(
        &self,
        entry: &DotfileEntry,
        index: usize,
        total: usize,
    ) -> Result<Option<ConflictResolution>>;

    /// Ask whether to link `count` files.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be used.
    fn confirm_link(&self, count: usize) -> Result<bool>;
}

/// Render `path` with the home directory shown as `~`.
#[must_use]
pub fn display_path(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}

/// A select option shown by label.
struct Labeled<T> {
    label: String,
    value: T,
}

impl<T> Labeled<T> {
    fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

impl<T> fmt::Display for Labeled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Map a cancelled prompt to `None`.
fn skippable<T>(result: Result<Option<T>, InquireError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(value),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// [`Prompter`] backed by `inquire`.
#[derive(Debug, Clone)]
pub struct InquirePrompter {
    home: PathBuf,
}

impl InquirePrompter {
    /// Prompter that abbreviates paths under `home`.
    #[must_use]
    pub fn new(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
        }
    }
}

impl Prompter for InquirePrompter {
    fn choose_source(&self, detected: Option<&Path>) -> Result<Option<SourceChoice>> {
        let mut options = Vec::new();
        if let Some(dir) = detected {
            options.push(Labeled::new(
                format!("Use existing {}", display_path(dir, &self.home)),
                SourceChoice::UseExisting(dir.to_path_buf()),
            ));
        }
        options.push(Labeled::new("Enter custom path", SourceChoice::CustomPath));
        options.push(Labeled::new("Clone from GitHub", SourceChoice::CloneFromGitHub));

        let choice = skippable(Select::new("Where are your dotfiles?", options).prompt_skippable())?;
        Ok(choice.map(|c| c.value))
    }

    fn input_path(&self) -> Result<Option<String>> {
        skippable(
            Text::new("Enter path to your dotfiles directory:")
                .with_placeholder("~/dotfiles")
                .prompt_skippable(),
        )
    }

    fn input_repo(&self) -> Result<Option<String>> {
        skippable(
            Text::new("Enter GitHub repo (user/repo or full URL):")
                .with_placeholder("user/dotfiles")
                .prompt_skippable(),
        )
    }

    fn resolve_conflict(
        &self,
        entry: &DotfileEntry,
        index: usize,
        total: usize,
    ) -> Result<Option<ConflictResolution>> {
        let kind = if entry.is_symlink {
            "a symlink to somewhere else"
        } else {
            "a real file or directory"
        };
        let message = format!(
            "Conflict {} of {total}: {} already exists. What should we do?",
            index + 1,
            display_path(&entry.target_path, &self.home),
        );
        let options = vec![
            Labeled::new("Backup and replace", ConflictResolution::Backup),
            Labeled::new("Skip", ConflictResolution::Skip),
            Labeled::new("Overwrite", ConflictResolution::Overwrite),
        ];
        let choice = skippable(
            Select::new(&message, options)
                .with_help_message(&format!("the target is {kind}"))
                .prompt_skippable(),
        )?;
        Ok(choice.map(|c| c.value))
    }

    fn confirm_link(&self, count: usize) -> Result<bool> {
        let answer = skippable(
            Confirm::new(&format!("Link {count} files?"))
                .with_default(true)
                .prompt_skippable(),
        )?;
        Ok(answer.unwrap_or(false))
    }
}

/// [`Prompter`] for non-interactive runs.
///
/// Accepts the detected directory, backs up every conflict, and confirms.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoPrompter;

impl Prompter for AutoPrompter {
    fn choose_source(&self, detected: Option<&Path>) -> Result<Option<SourceChoice>> {
        match detected {
            Some(dir) => Ok(Some(SourceChoice::UseExisting(dir.to_path_buf()))),
            None => bail!("no dotfiles directory found; pass a path to `nvs init`"),
        }
    }

    fn input_path(&self) -> Result<Option<String>> {
        bail!("a dotfiles path is required with --yes")
    }

    fn input_repo(&self) -> Result<Option<String>> {
        bail!("a repository is required with --yes")
    }

    fn resolve_conflict(
        &self,
        _entry: &DotfileEntry,
        _index: usize,
        _total: usize,
    ) -> Result<Option<ConflictResolution>> {
        Ok(Some(ConflictResolution::Backup))
    }

    fn confirm_link(&self, _count: usize) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn entry() -> DotfileEntry {
        DotfileEntry {
            name: "vimrc".to_string(),
            source_path: PathBuf::from("/repo/vimrc"),
            target_path: PathBuf::from("/home/u/.vimrc"),
            exists: true,
            is_symlink: false,
            has_conflict: true,
        }
    }

    #[test]
    fn display_path_abbreviates_home() {
        let home = Path::new("/home/u");
        assert_eq!(display_path(Path::new("/home/u/dotfiles"), home), "~/dotfiles");
        assert_eq!(display_path(Path::new("/home/u"), home), "~");
        assert_eq!(display_path(Path::new("/etc/hosts"), home), "/etc/hosts");
        assert_eq!(display_path(Path::new("/home/user2"), home), "/home/user2");
    }

    #[test]
    fn labeled_displays_label_only() {
        let option = Labeled::new("Skip", ConflictResolution::Skip);
        assert_eq!(option.to_string(), "Skip");
    }

    #[test]
    fn cancellation_is_none() {
        let cancelled: Result<Option<bool>, InquireError> = Err(InquireError::OperationCanceled);
        assert_eq!(skippable(cancelled).unwrap(), None);
        let interrupted: Result<Option<bool>, InquireError> =
            Err(InquireError::OperationInterrupted);
        assert_eq!(skippable(interrupted).unwrap(), None);
        let broken: Result<Option<bool>, InquireError> = Err(InquireError::NotTTY);
        assert!(skippable(broken).is_err());
    }

    #[test]
    fn auto_prompter_accepts_defaults() {
        let auto = AutoPrompter;
        let detected = PathBuf::from("/home/u/dotfiles");
        assert_eq!(
            auto.choose_source(Some(&detected)).unwrap(),
            Some(SourceChoice::UseExisting(detected))
        );
        assert_eq!(
            auto.resolve_conflict(&entry(), 0, 1).unwrap(),
            Some(ConflictResolution::Backup)
        );
        assert!(auto.confirm_link(3).unwrap());
    }

    #[test]
    fn auto_prompter_needs_a_source() {
        assert!(AutoPrompter.choose_source(None).is_err());
        assert!(AutoPrompter.input_repo().is_err());
    }
}
