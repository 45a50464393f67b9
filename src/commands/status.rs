//! `nvs status`: recorded links and repositories against the live system.
use anyhow::Result;

use super::Context;
use crate::cli::StatusOpts;
use crate::operations::FileSystemOps;
use crate::resources::symlink::SymlinkResource;
use crate::resources::{Resource as _, ResourceState};
use crate::source::{RepoStatus, repo_status};
use crate::state::LinkRecord;

/// Live state of a recorded link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHealth {
    /// The symlink still points at its source.
    Linked,
    /// A symlink is there but points somewhere else.
    Changed,
    /// Something other than a symlink is there.
    Replaced,
    /// Nothing is there.
    Missing,
}

impl LinkHealth {
    const fn label(self) -> &'static str {
        match self {
            Self::Linked => "\x1b[32m✓ linked\x1b[0m",
            Self::Changed => "\x1b[33m~ changed\x1b[0m",
            Self::Replaced => "\x1b[31m✗ replaced\x1b[0m",
            Self::Missing => "\x1b[31m✗ missing\x1b[0m",
        }
    }
}

/// Inspect the target of `record`.
#[must_use]
pub fn link_health(fs: &dyn FileSystemOps, record: &LinkRecord) -> LinkHealth {
    let resource = SymlinkResource::new(record.source.clone(), record.target.clone(), fs);
    match resource.current_state() {
        Ok(ResourceState::Correct) => LinkHealth::Linked,
        Ok(ResourceState::Incorrect { .. }) => LinkHealth::Changed,
        Ok(ResourceState::Invalid { .. }) => LinkHealth::Replaced,
        Ok(ResourceState::Missing) | Err(_) => LinkHealth::Missing,
    }
}

fn describe_sync(status: RepoStatus) -> String {
    match (status.ahead, status.behind) {
        (0, 0) => "up to date".to_string(),
        (ahead, 0) => format!("{ahead} ahead"),
        (0, behind) => format!("{behind} behind"),
        (ahead, behind) => format!("{ahead} ahead, {behind} behind"),
    }
}

/// Run the status command.
///
/// # Errors
///
/// Returns an error if the state file cannot be read.
pub fn run(opts: &StatusOpts, ctx: &Context<'_>) -> Result<()> {
    let state = ctx.store.load()?;

    ctx.log.stage("Dotfiles");
    ctx.log
        .info(&format!("directory: {}", ctx.display(&state.dotfiles_dir)));

    ctx.log.stage("Links");
    if state.links.is_empty() {
        ctx.log.info("no links recorded; run `nvs init` or `nvs add`");
    }
    for record in &state.links {
        let health = link_health(ctx.fs, record);
        ctx.log.info(&format!(
            "{} {} -> {}",
            health.label(),
            ctx.display(&record.target),
            ctx.display(&record.source)
        ));
    }

    ctx.log.stage("Repositories");
    if state.repos.is_empty() {
        ctx.log.info("no repositories recorded");
    }
    for repo in &state.repos {
        if !repo.local_path.is_dir() {
            ctx.log.warn(&format!(
                "{}/{}: clone missing at {}",
                repo.owner,
                repo.name,
                ctx.display(&repo.local_path)
            ));
            continue;
        }
        let status = repo_status(ctx.exec, &repo.local_path, opts.fetch);
        ctx.log
            .info(&format!("{}/{}: {}", repo.owner, repo.name, describe_sync(status)));
    }

    Ok(())
}
