//! Subcommand orchestration.
//!
//! `init` and `add` share [`run_link_flow`], which drives the
//! [`Step`] state machine from source resolution to the final link report.
pub mod add;
pub mod init;
pub mod status;
pub mod unlink;
pub mod update;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::GlobalOpts;
use crate::error::{NvsError, SourceError};
use crate::exec::Executor;
use crate::flow::{Event, Step};
use crate::link::{ConflictResolution, Linker, Resolutions};
use crate::logging::{LinkStatus, Logger};
use crate::operations::FileSystemOps;
use crate::prompt::{Prompter, display_path};
use crate::scan::{self, ScanResult};
use crate::source::{self, GitHubRepo};
use crate::state::StateStore;

/// Everything a command needs from its environment.
pub struct Context<'a> {
    /// Home directory links are created in.
    pub home: PathBuf,
    /// Preview only; never mutate.
    pub dry_run: bool,
    /// Filesystem primitives.
    pub fs: &'a dyn FileSystemOps,
    /// External command runner.
    pub exec: &'a dyn Executor,
    /// Interactive questions.
    pub prompter: &'a dyn Prompter,
    /// Logger for console, file, and summary output.
    pub log: &'a Logger,
    /// Persisted state.
    pub store: StateStore,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("home", &self.home)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl<'a> Context<'a> {
    /// Build a context for `home`.
    #[must_use]
    pub fn new(
        home: PathBuf,
        dry_run: bool,
        fs: &'a dyn FileSystemOps,
        exec: &'a dyn Executor,
        prompter: &'a dyn Prompter,
        log: &'a Logger,
    ) -> Self {
        let store = StateStore::new(&home);
        Self {
            home,
            dry_run,
            fs,
            exec,
            prompter,
            log,
            store,
        }
    }

    /// Render `path` relative to the home directory.
    #[must_use]
    pub fn display(&self, path: &Path) -> String {
        display_path(path, &self.home)
    }
}

/// Resolve the home directory from `--home` or the environment.
///
/// # Errors
///
/// Returns an error if no override is given and neither `HOME` nor
/// `USERPROFILE` is set.
pub fn resolve_home(global: &GlobalOpts) -> Result<PathBuf> {
    if let Some(home) = &global.home {
        return Ok(home.clone());
    }
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .context("cannot determine home directory. Use --home")
}

/// Expand a leading `~` in `input` and check that it names a directory.
///
/// # Errors
///
/// Returns [`SourceError::NotADirectory`] if the expanded path is not an
/// existing directory.
pub fn resolve_local_dir(input: &str, home: &Path) -> Result<PathBuf, SourceError> {
    let expanded = shellexpand::tilde_with_context(input.trim(), || {
        Some(home.to_string_lossy().into_owned())
    });
    let path = PathBuf::from(expanded.into_owned());
    if !path.is_dir() {
        return Err(SourceError::NotADirectory(path));
    }
    Ok(dunce::canonicalize(&path).unwrap_or(path))
}

/// Outcome of resolving a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Scan this local directory.
    Dir(PathBuf),
    /// Scan a clone of this repository, cloning it first if needed.
    Repo(GitHubRepo),
    /// The source cannot be used.
    Invalid(String),
    /// The user cancelled.
    Cancelled,
}

/// Command-specific part of the link flow.
pub trait SourceResolver {
    /// Choose the source to scan.
    ///
    /// # Errors
    ///
    /// Returns an error if a prompt fails.
    fn resolve(&mut self, ctx: &Context<'_>) -> Result<Resolved>;

    /// Whether a failed scan returns to [`resolve`](Self::resolve).
    fn retry_on_scan_failure(&self) -> bool;

    /// Called once the flow is done with the directory that was scanned.
    ///
    /// # Errors
    ///
    /// Returns an error if follow-up bookkeeping fails.
    fn finish(&mut self, ctx: &Context<'_>, dir: &Path) -> Result<()>;
}

/// Run the shared flow: resolve, clone, scan, resolve conflicts, confirm,
/// and link.
///
/// Returns the terminal [`Step`]; an `Error` step is returned as `Ok` so the
/// caller can report it.
///
/// # Errors
///
/// Returns an error if a prompt fails, the state file cannot be read or
/// written, or the flow receives an event it does not accept.
pub fn run_link_flow(ctx: &Context<'_>, resolver: &mut dyn SourceResolver) -> Result<Step> {
    let mut step = Step::ResolvingSource;
    let mut dir: Option<PathBuf> = None;
    let mut repo: Option<GitHubRepo> = None;
    let mut result = ScanResult::default();
    let mut resolutions = Resolutions::new();

    while !step.is_terminal() {
        let event = match &step {
            Step::ResolvingSource => match resolver.resolve(ctx)? {
                Resolved::Dir(path) => {
                    dir = Some(path);
                    Event::SourceReady
                }
                Resolved::Repo(r) => {
                    let local = r.local_path(&ctx.home);
                    if local.exists() {
                        ctx.log
                            .info(&format!("using existing clone {}", ctx.display(&local)));
                        dir = Some(local);
                        Event::SourceReady
                    } else {
                        repo = Some(r);
                        Event::CloneRequired
                    }
                }
                Resolved::Invalid(message) => Event::InvalidSource(message),
                Resolved::Cancelled => Event::Declined,
            },
            Step::Cloning => match repo.take() {
                Some(r) if ctx.dry_run => {
                    ctx.log.dry_run(&format!(
                        "clone {} into {}",
                        r.clone_url(),
                        ctx.display(&r.local_path(&ctx.home))
                    ));
                    Event::CloneSkipped
                }
                Some(r) => match clone_source(ctx, &r) {
                    Ok(path) => {
                        dir = Some(path);
                        Event::CloneFinished
                    }
                    Err(e) => Event::CloneFailed(e.to_string()),
                },
                None => Event::CloneFailed("no repository to clone".to_string()),
            },
            Step::Scanning => {
                let path = dir.clone().unwrap_or_default();
                ctx.log.stage(&format!("Scanning {}", ctx.display(&path)));
                match scan::scan(ctx.fs, &path, &ctx.home) {
                    Ok(scanned) => {
                        let event = Event::ScanFinished {
                            files: scanned.files.len(),
                            conflicts: scanned.conflicts.len(),
                        };
                        log_scan(ctx, &scanned);
                        result = scanned;
                        resolutions.clear();
                        event
                    }
                    Err(e) => {
                        let recoverable = resolver.retry_on_scan_failure();
                        if recoverable {
                            ctx.log.warn(&e.to_string());
                        }
                        Event::ScanFailed {
                            message: NvsError::from(e).to_string(),
                            recoverable,
                        }
                    }
                }
            }
            Step::ResolvingConflicts { current, total } => {
                let entry = result
                    .conflicts
                    .get(*current)
                    .context("conflict index out of range")?;
                match ctx.prompter.resolve_conflict(entry, *current, *total)? {
                    Some(resolution) => {
                        ctx.log
                            .debug(&format!("{}: {resolution}", entry.name));
                        resolutions.insert(entry.name.clone(), resolution);
                        Event::ConflictResolved
                    }
                    None => Event::Declined,
                }
            }
            Step::Preview => {
                let count = preview(ctx, &result, &resolutions);
                if ctx.dry_run || ctx.prompter.confirm_link(count)? {
                    Event::Confirmed
                } else {
                    Event::Declined
                }
            }
            Step::Linking => {
                let linked = if ctx.dry_run {
                    dry_run_links(ctx, &result, &resolutions);
                    0
                } else {
                    link(ctx, &result, &resolutions)
                };
                Event::LinkFinished { linked }
            }
            Step::Done { .. } | Step::Aborted | Step::Error(_) => break,
        };
        step = step.next(event).map_err(NvsError::from)?;
    }

    if let (Step::Done { .. }, Some(path)) = (&step, &dir) {
        resolver.finish(ctx, path)?;
    }
    Ok(step)
}

/// Clone `repo` into its local path and record it.
fn clone_source(ctx: &Context<'_>, repo: &GitHubRepo) -> Result<PathBuf, NvsError> {
    let url = repo.clone_url();
    let dest = repo.local_path(&ctx.home);
    ctx.log.stage(&format!("Cloning {repo}"));
    source::clone_repo(&url, &dest, &ProgressBar::new_spinner())?;
    ctx.log.info(&format!("cloned into {}", ctx.display(&dest)));
    ctx.store.add_repo(&repo.info(&ctx.home))?;
    Ok(dest)
}

fn log_scan(ctx: &Context<'_>, result: &ScanResult) {
    if result.files.is_empty() {
        ctx.log.warn("no dotfiles found");
        return;
    }
    ctx.log.info(&format!(
        "found {} config files with {} conflicts",
        result.files.len(),
        result.conflicts.len()
    ));
}

/// List what will happen and return the number of entries to link.
fn preview(ctx: &Context<'_>, result: &ScanResult, resolutions: &Resolutions) -> usize {
    ctx.log.stage("Preview");
    let mut count = 0;
    for entry in &result.files {
        let resolution = resolutions.get(&entry.name).copied().unwrap_or_default();
        let note = if entry.has_conflict {
            format!(" ({resolution})")
        } else if entry.is_linked() {
            " (already linked)".to_string()
        } else {
            String::new()
        };
        if resolution != ConflictResolution::Skip {
            count += 1;
        }
        ctx.log.info(&format!(
            "{} -> {}{note}",
            entry.name,
            ctx.display(&entry.target_path)
        ));
    }
    count
}

fn dry_run_links(ctx: &Context<'_>, result: &ScanResult, resolutions: &Resolutions) {
    ctx.log.stage("Linking");
    for entry in &result.files {
        let resolution = resolutions.get(&entry.name).copied().unwrap_or_default();
        if resolution == ConflictResolution::Skip {
            ctx.log.record(&entry.name, LinkStatus::Skipped, None);
            continue;
        }
        let backup = if entry.has_conflict
            && matches!(
                resolution,
                ConflictResolution::Backup | ConflictResolution::Merge
            ) {
            " after backing up the existing file"
        } else {
            ""
        };
        ctx.log.dry_run(&format!(
            "would link {} -> {}{backup}",
            ctx.display(&entry.target_path),
            entry.source_path.display()
        ));
        ctx.log.record(&entry.name, LinkStatus::DryRun, None);
    }
}

fn link(ctx: &Context<'_>, result: &ScanResult, resolutions: &Resolutions) -> usize {
    ctx.log.stage("Linking");
    let total = result
        .files
        .iter()
        .filter(|e| resolutions.get(&e.name) != Some(&ConflictResolution::Skip))
        .count();

    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("  {msg} [{bar:30.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_message("Linking files...");

    let mut recorder = ctx.store.clone();
    let report = Linker::new(ctx.fs, ctx.log).link_all(
        &result.files,
        resolutions,
        &mut recorder,
        |n| bar.set_position(n as u64),
    );
    bar.finish_and_clear();
    report.linked
}

/// Report a terminal [`Step`] for `init` and `add`.
///
/// A finished run prints the summary and the final linked count before any
/// recorded failure turns into an error.
///
/// # Errors
///
/// Returns an error for an `Error` step or if any dotfile failed.
pub fn report_outcome(
    ctx: &Context<'_>,
    step: &Step,
    done_message: impl FnOnce(usize) -> String,
) -> Result<()> {
    match step {
        Step::Done { linked } => {
            ctx.log.print_summary();
            if !ctx.dry_run {
                ctx.log.info(&done_message(*linked));
            }
            let failed = ctx.log.failure_count();
            if failed > 0 {
                bail!("{failed} dotfile(s) failed to link");
            }
            Ok(())
        }
        Step::Aborted => {
            ctx.log.info("cancelled, nothing was linked");
            Ok(())
        }
        Step::Error(message) => bail!("{message}"),
        other => bail!("flow stopped while {}", other.name()),
    }
}

/// Fixtures shared by the command tests.
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
pub mod test_helpers {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;
    use crate::logging::isolated_logger;
    use crate::operations::SystemFileSystemOps;
    use crate::prompt::MockPrompter;

    /// A temporary home with a dotfiles directory inside it.
    #[derive(Debug)]
    pub struct Fixture {
        /// Keeps the directory alive.
        pub tmp: tempfile::TempDir,
        /// `<tmp>/home`.
        pub home: PathBuf,
        /// `<tmp>/home/dotfiles`.
        pub repo: PathBuf,
    }

    impl Fixture {
        /// Home at `<tmp>/home`, dotfiles at `<tmp>/home/dotfiles`.
        pub fn new(files: &[&str]) -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let home = tmp.path().join("home");
            let repo = home.join("dotfiles");
            std::fs::create_dir_all(&repo).unwrap();
            for name in files {
                std::fs::write(repo.join(name), format!("repo {name}")).unwrap();
            }
            Self { tmp, home, repo }
        }
    }

    /// Run `f` with a context over the real filesystem.
    pub fn with_context<R>(
        fixture: &Fixture,
        prompter: &MockPrompter,
        dry_run: bool,
        f: impl FnOnce(&Context<'_>) -> R,
    ) -> R {
        let (log, _logtmp, _guard) = isolated_logger();
        let exec = MockExecutor::with_responses(vec![]);
        let ctx = Context::new(
            fixture.home.clone(),
            dry_run,
            &SystemFileSystemOps,
            &exec,
            prompter,
            &log,
        );
        f(&ctx)
    }
}
