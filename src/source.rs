//! Dotfiles sources: GitHub repository parsing, cloning, and sync status.
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use git2::build::RepoBuilder;
use git2::{BranchType, FetchOptions, RemoteCallbacks, Repository};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::SourceError;
use crate::exec::Executor;
use crate::state::{RepoInfo, nvs_dir};

/// A GitHub repository named by owner and repository name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    /// Account or organisation.
    pub owner: String,
    /// Repository name, without a `.git` suffix.
    pub name: String,
}

impl GitHubRepo {
    /// HTTPS clone URL.
    #[must_use]
    pub fn clone_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner, self.name)
    }

    /// Where the clone lives: `<home>/.nvs/repos/<owner>/<name>`.
    #[must_use]
    pub fn local_path(&self, home: &Path) -> PathBuf {
        nvs_dir(home).join("repos").join(&self.owner).join(&self.name)
    }

    /// The persisted record for a clone of this repository.
    #[must_use]
    pub fn info(&self, home: &Path) -> RepoInfo {
        RepoInfo {
            owner: self.owner.clone(),
            name: self.name.clone(),
            url: self.clone_url(),
            local_path: self.local_path(home),
        }
    }
}

impl std::fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse `owner/repo` shorthand or a GitHub URL.
///
/// URLs may use `https://github.com/owner/repo`, `git@github.com:owner/repo`,
/// or either form with a `.git` suffix.  Returns `None` for anything else.
///
/// # Examples
///
/// ```
/// use nvs_cli::source::parse_github_url;
///
/// let repo = parse_github_url("git@github.com:alice/dotfiles.git").unwrap();
/// assert_eq!(repo.to_string(), "alice/dotfiles");
/// assert!(parse_github_url("not a repo").is_none());
/// ```
#[must_use]
pub fn parse_github_url(input: &str) -> Option<GitHubRepo> {
    let from_url = input.match_indices("github.com").find_map(|(idx, host)| {
        let rest = input.get(idx + host.len()..)?;
        let path = rest.strip_prefix('/').or_else(|| rest.strip_prefix(':'))?;
        let (owner, name) = split_owner_repo(path)?;
        let name = match name.strip_suffix(".git") {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => name,
        };
        Some(GitHubRepo {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    });
    from_url.or_else(|| {
        let (owner, name) = split_owner_repo(input)?;
        Some(GitHubRepo {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    })
}

/// Split `owner/name` where the owner is word characters or `-` and the
/// name additionally allows `.`.
fn split_owner_repo(s: &str) -> Option<(&str, &str)> {
    let (owner, name) = s.split_once('/')?;
    let word = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
    let valid = !owner.is_empty()
        && !name.is_empty()
        && owner.chars().all(word)
        && name.chars().all(|c| word(c) || c == '.');
    valid.then_some((owner, name))
}

/// Clone `url` into `dest`, drawing transfer progress on `bar`.
///
/// Missing parent directories of `dest` are created.
///
/// # Errors
///
/// Returns [`SourceError::CloneFailed`] if the directory cannot be created or
/// libgit2 reports an error.
pub fn clone_repo(url: &str, dest: &Path, bar: &ProgressBar) -> Result<(), SourceError> {
    let fail = |message: String| SourceError::CloneFailed {
        url: url.to_string(),
        message,
    };

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| fail(format!("create {}: {e}", parent.display())))?;
    }

    let style = ProgressStyle::with_template(
        "{elapsed_precise:.green}  {msg:<40}  [{wide_bar:.yellow/blue}] {pos}/{len}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ");
    bar.set_style(style);
    bar.set_message(url.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));

    let mut throttle = Instant::now();
    let mut rc = RemoteCallbacks::new();
    rc.transfer_progress(|progress| {
        if throttle.elapsed() > Duration::from_millis(10) {
            throttle = Instant::now();
            bar.set_length(progress.total_objects() as u64);
            bar.set_position(progress.received_objects() as u64);
        }
        true
    });

    let mut fo = FetchOptions::new();
    fo.remote_callbacks(rc);
    let result = RepoBuilder::new().fetch_options(fo).clone(url, dest);
    bar.finish_and_clear();

    result
        .map(|_| ())
        .map_err(|e| fail(e.message().to_string()))
}

/// Commits the local branch is ahead of and behind its upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoStatus {
    /// Local commits not on the upstream.
    pub ahead: usize,
    /// Upstream commits not yet pulled.
    pub behind: usize,
}

/// Compare the checked-out branch of the repository at `path` with its
/// upstream.
///
/// # Errors
///
/// Returns a [`git2::Error`] if the repository cannot be opened, `HEAD` is
/// detached, or the branch has no upstream.
pub fn ahead_behind(path: &Path) -> Result<RepoStatus, git2::Error> {
    let repo = Repository::open(path)?;
    let head = repo.head()?;
    let branch_name = head
        .shorthand()
        .ok_or_else(|| git2::Error::from_str("HEAD is not a named branch"))?;
    let branch = repo.find_branch(branch_name, BranchType::Local)?;
    let upstream = branch.upstream()?;

    let local = branch
        .get()
        .target()
        .ok_or_else(|| git2::Error::from_str("branch has no target"))?;
    let remote = upstream
        .get()
        .target()
        .ok_or_else(|| git2::Error::from_str("upstream has no target"))?;

    let (ahead, behind) = repo.graph_ahead_behind(local, remote)?;
    Ok(RepoStatus { ahead, behind })
}

/// Sync status of the repository at `path`, optionally fetching first.
///
/// Every failure degrades to `0/0`; the reason is logged at debug level.
pub fn repo_status(exec: &dyn Executor, path: &Path, fetch: bool) -> RepoStatus {
    if fetch && let Err(e) = exec.run_in(path, "git", &["fetch", "--quiet"]) {
        tracing::debug!("fetch failed in {}: {e:#}", path.display());
    }
    ahead_behind(path).unwrap_or_else(|e| {
        tracing::debug!("no ahead/behind for {}: {}", path.display(), e.message());
        RepoStatus::default()
    })
}

/// Fast-forward the repository at `path` from its upstream.
///
/// Returns `true` if new commits were pulled.
///
/// # Errors
///
/// Returns an error if `git pull --ff-only` fails.
pub fn pull(exec: &dyn Executor, path: &Path) -> anyhow::Result<bool> {
    let result = exec.run_in(path, "git", &["pull", "--ff-only"])?;
    Ok(!result.stdout.contains("Already up to date"))
}
