//! `nvs unlink`: remove symlinks created by nvs.
use std::path::PathBuf;

use anyhow::{Result, bail};

use super::Context;
use crate::cli::UnlinkOpts;
use crate::resources::symlink::SymlinkResource;
use crate::resources::{Applicable as _, ResourceChange};

/// Run the unlink command.
///
/// Only symbolic links are removed; a real file or directory at a target is
/// reported and left alone.  Link records are kept.
///
/// # Errors
///
/// Returns an error if the state file cannot be read or any link could not
/// be removed.
pub fn run(opts: &UnlinkOpts, ctx: &Context<'_>) -> Result<()> {
    let state = ctx.store.load()?;
    let targets: Vec<(PathBuf, PathBuf)> = if opts.targets.is_empty() {
        state
            .links
            .iter()
            .map(|l| (l.source.clone(), l.target.clone()))
            .collect()
    } else {
        opts.targets
            .iter()
            .map(|target| {
                let source = state
                    .links
                    .iter()
                    .find(|l| &l.target == target)
                    .map_or_else(PathBuf::new, |l| l.source.clone());
                (source, target.clone())
            })
            .collect()
    };

    ctx.log.stage("Removing links");
    if targets.is_empty() {
        ctx.log.info("no links recorded");
        return Ok(());
    }

    let mut removed = 0usize;
    let mut failed = 0usize;
    for (source, target) in targets {
        let shown = ctx.display(&target);
        if ctx.dry_run {
            ctx.log.dry_run(&format!("remove {shown}"));
            continue;
        }
        let resource = SymlinkResource::new(source, target, ctx.fs);
        match resource.remove() {
            Ok(ResourceChange::Applied) => {
                removed += 1;
                ctx.log.info(&format!("removed {shown}"));
            }
            Ok(ResourceChange::Skipped { reason }) => {
                ctx.log.info(&format!("{shown}: {reason}"));
            }
            Err(e) => {
                failed += 1;
                ctx.log.error(&format!("{shown}: {e:#}"));
            }
        }
    }

    if !ctx.dry_run {
        ctx.log.info(&format!("removed {removed} links"));
    }
    if failed > 0 {
        bail!("{failed} link(s) could not be removed");
    }
    Ok(())
}
