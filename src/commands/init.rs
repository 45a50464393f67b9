//! `nvs init`: find or choose a dotfiles directory and link it.
use std::path::Path;

use anyhow::Result;

use super::{Context, Resolved, SourceResolver, report_outcome, resolve_local_dir, run_link_flow};
use crate::cli::InitOpts;
use crate::prompt::SourceChoice;
use crate::source::parse_github_url;
use crate::state::detect_existing_dotfiles;

/// Source resolution for `init`.
///
/// An explicit path is used once; otherwise the user chooses between the
/// detected directory, a typed path, and a GitHub repository, and comes
/// back here whenever a scan fails.
#[derive(Debug)]
struct InitSource {
    path: Option<String>,
}

impl SourceResolver for InitSource {
    fn resolve(&mut self, ctx: &Context<'_>) -> Result<Resolved> {
        if let Some(path) = self.path.take() {
            return Ok(match resolve_local_dir(&path, &ctx.home) {
                Ok(dir) => Resolved::Dir(dir),
                Err(e) => Resolved::Invalid(e.to_string()),
            });
        }

        let detected = detect_existing_dotfiles(&ctx.home);
        if let Some(dir) = &detected {
            ctx.log.debug(&format!("detected {}", dir.display()));
        }

        loop {
            let Some(choice) = ctx.prompter.choose_source(detected.as_deref())? else {
                return Ok(Resolved::Cancelled);
            };
            match choice {
                SourceChoice::UseExisting(dir) => return Ok(Resolved::Dir(dir)),
                SourceChoice::CustomPath => {
                    let Some(input) = ctx.prompter.input_path()? else {
                        continue;
                    };
                    match resolve_local_dir(&input, &ctx.home) {
                        Ok(dir) => return Ok(Resolved::Dir(dir)),
                        Err(e) => ctx.log.warn(&e.to_string()),
                    }
                }
                SourceChoice::CloneFromGitHub => {
                    let Some(input) = ctx.prompter.input_repo()? else {
                        continue;
                    };
                    match parse_github_url(input.trim()) {
                        Some(repo) => return Ok(Resolved::Repo(repo)),
                        None => ctx.log.warn(&format!("invalid repository: {input}")),
                    }
                }
            }
        }
    }

    fn retry_on_scan_failure(&self) -> bool {
        true
    }

    fn finish(&mut self, ctx: &Context<'_>, dir: &Path) -> Result<()> {
        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("set dotfiles directory to {}", ctx.display(dir)));
            return Ok(());
        }
        ctx.store.set_dotfiles_dir(dir)?;
        ctx.log.debug(&format!("dotfiles directory: {}", dir.display()));
        Ok(())
    }
}

/// Run the init command.
///
/// # Errors
///
/// Returns an error if the flow fails, a given path is unusable, or any
/// dotfile fails to link.
pub fn run(opts: &InitOpts, ctx: &Context<'_>) -> Result<()> {
    ctx.log.stage("Setting up dotfiles");
    let mut resolver = InitSource {
        path: opts.path.clone(),
    };
    let step = run_link_flow(ctx, &mut resolver)?;
    report_outcome(ctx, &step, |linked| format!("Linked {linked} files"))
}
