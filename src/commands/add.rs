//! `nvs add`: clone a GitHub repository and link its dotfiles.
use std::path::Path;

use anyhow::Result;

use super::{Context, Resolved, SourceResolver, report_outcome, run_link_flow};
use crate::cli::AddOpts;
use crate::error::SourceError;
use crate::source::parse_github_url;

#[derive(Debug)]
struct AddSource<'a> {
    repo: &'a str,
}

impl SourceResolver for AddSource<'_> {
    fn resolve(&mut self, ctx: &Context<'_>) -> Result<Resolved> {
        ctx.log.debug(&format!("parsing {}", self.repo));
        Ok(parse_github_url(self.repo.trim()).map_or_else(
            || Resolved::Invalid(SourceError::InvalidRepository(self.repo.to_string()).to_string()),
            Resolved::Repo,
        ))
    }

    fn retry_on_scan_failure(&self) -> bool {
        false
    }

    fn finish(&mut self, _ctx: &Context<'_>, _dir: &Path) -> Result<()> {
        Ok(())
    }
}

/// Run the add command.
///
/// # Errors
///
/// Returns an error if the repository argument is invalid, the clone or
/// scan fails, or any dotfile fails to link.
pub fn run(opts: &AddOpts, ctx: &Context<'_>) -> Result<()> {
    let name = parse_github_url(opts.repo.trim()).map_or_else(|| opts.repo.clone(), |r| r.to_string());
    ctx.log.stage(&format!("Adding {name}"));

    let mut resolver = AddSource { repo: &opts.repo };
    let step = run_link_flow(ctx, &mut resolver)?;
    report_outcome(ctx, &step, |linked| {
        format!("Linked {linked} files from {name}")
    })
}
