//! Persisted state in `~/.nvs/config.json`.
//!
//! The file records the chosen dotfiles directory, every repository cloned
//! by `nvs add`, and every link created.  Records are append-only and
//! deduplicated by their natural key; nothing in the link engine reads them
//! back to decide conflicts.
//!
//! Each mutation is a whole-file read-modify-write.  Two concurrent runs can
//! lose each other's records.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::link::LinkRecorder;

/// How a dotfile is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// A symbolic link into the repository.
    Symlink,
    /// Reserved for copied dotfiles; never produced.
    Copy,
}

/// One persisted link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Path inside the dotfiles repository.
    pub source: PathBuf,
    /// Path under the home directory.
    pub target: PathBuf,
    /// Installation method.
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

impl LinkRecord {
    /// Build a symlink record.
    #[must_use]
    pub const fn symlink(source: PathBuf, target: PathBuf) -> Self {
        Self {
            source,
            target,
            kind: LinkKind::Symlink,
        }
    }
}

/// One persisted repository clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoInfo {
    /// GitHub owner.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Clone URL.
    pub url: String,
    /// Where the clone lives.
    pub local_path: PathBuf,
}

/// Contents of the state file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// The dotfiles directory chosen by `nvs init`.
    #[serde(default)]
    pub dotfiles_dir: PathBuf,
    /// Repositories cloned by `nvs add`.
    #[serde(default)]
    pub repos: Vec<RepoInfo>,
    /// Links created so far.
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

/// Reads and writes [`State`] for one home directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    home: PathBuf,
    path: PathBuf,
}

impl StateStore {
    /// Store for `<home>/.nvs/config.json`.
    #[must_use]
    pub fn new(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
            path: nvs_dir(home).join("config.json"),
        }
    }

    /// Path of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state, falling back to defaults when the file is absent.
    ///
    /// Fields missing from the file take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] if the file exists but cannot be read and
    /// [`StateError::Parse`] if it is not valid state JSON.
    pub fn load(&self) -> Result<State, StateError> {
        let mut state = match fs::read_to_string(&self.path) {
            Ok(data) => serde_json::from_str(&data).map_err(|source| StateError::Parse {
                path: self.path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => State::default(),
            Err(source) => {
                return Err(StateError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if state.dotfiles_dir.as_os_str().is_empty() {
            state.dotfiles_dir = self.home.join("dotfiles");
        }
        Ok(state)
    }

    /// Write `state` as pretty-printed JSON, creating `~/.nvs/repos/` first.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] if the directory or file cannot be written.
    pub fn save(&self, state: &State) -> Result<(), StateError> {
        let io_err = |source| StateError::Io {
            path: self.path.clone(),
            source,
        };
        fs::create_dir_all(nvs_dir(&self.home).join("repos")).map_err(io_err)?;
        let json = serde_json::to_string_pretty(state).map_err(|source| StateError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(io_err)
    }

    /// Append `repo` unless a repository with the same owner and name is
    /// already recorded.
    ///
    /// # Errors
    ///
    /// Propagates load and save errors.
    pub fn add_repo(&self, repo: &RepoInfo) -> Result<(), StateError> {
        let mut state = self.load()?;
        if state
            .repos
            .iter()
            .any(|r| r.owner == repo.owner && r.name == repo.name)
        {
            return Ok(());
        }
        state.repos.push(repo.clone());
        self.save(&state)
    }

    /// Append `link` unless its target is already recorded.
    ///
    /// # Errors
    ///
    /// Propagates load and save errors.
    pub fn add_link(&self, link: &LinkRecord) -> Result<(), StateError> {
        let mut state = self.load()?;
        if state.links.iter().any(|l| l.target == link.target) {
            return Ok(());
        }
        state.links.push(link.clone());
        self.save(&state)
    }

    /// Record the dotfiles directory chosen by `nvs init`.
    ///
    /// # Errors
    ///
    /// Propagates load and save errors.
    pub fn set_dotfiles_dir(&self, dir: &Path) -> Result<(), StateError> {
        let mut state = self.load()?;
        state.dotfiles_dir = dir.to_path_buf();
        self.save(&state)
    }
}

impl LinkRecorder for StateStore {
    fn record_link(&mut self, record: &LinkRecord) -> Result<(), StateError> {
        self.add_link(record)
    }
}

/// `<home>/.nvs`.
#[must_use]
pub fn nvs_dir(home: &Path) -> PathBuf {
    home.join(".nvs")
}

/// Well-known dotfiles locations, in the order they are tried.
#[must_use]
pub fn common_dotfiles_paths(home: &Path) -> [PathBuf; 4] {
    [
        home.join("dotfiles"),
        home.join(".dotfiles"),
        home.join("code").join("dotfiles"),
        home.join("Code").join("dotfiles"),
    ]
}

/// Return the first well-known dotfiles location that exists.
#[must_use]
pub fn detect_existing_dotfiles(home: &Path) -> Option<PathBuf> {
    common_dotfiles_paths(home)
        .into_iter()
        .find(|p| p.symlink_metadata().is_ok())
}
