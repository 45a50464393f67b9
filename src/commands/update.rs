//! `nvs update`: pull every recorded repository.
use anyhow::Result;

use super::Context;
use crate::source::pull;

/// Run the update command.
///
/// A failed pull is a warning; the remaining repositories are still pulled.
///
/// # Errors
///
/// Returns an error if the state file cannot be read.
pub fn run(ctx: &Context<'_>) -> Result<()> {
    let state = ctx.store.load()?;

    ctx.log.stage("Updating repositories");
    if state.repos.is_empty() {
        ctx.log.info("no repositories recorded; run `nvs add` first");
        return Ok(());
    }
    if !ctx.dry_run && !ctx.exec.which("git") {
        ctx.log.warn("git not found on PATH; skipping update");
        return Ok(());
    }

    for repo in &state.repos {
        let name = format!("{}/{}", repo.owner, repo.name);
        if ctx.dry_run {
            ctx.log.dry_run(&format!(
                "git pull in {}",
                ctx.display(&repo.local_path)
            ));
            continue;
        }
        ctx.log
            .debug(&format!("pulling {}", repo.local_path.display()));
        match pull(ctx.exec, &repo.local_path) {
            Ok(true) => ctx.log.info(&format!("{name}: updated")),
            Ok(false) => ctx.log.info(&format!("{name}: already up to date")),
            Err(e) => ctx.log.warn(&format!("{name}: git pull failed: {e:#}")),
        }
    }
    Ok(())
}
