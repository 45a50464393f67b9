//! The production [`Log`] implementation.
use std::path::PathBuf;
use std::sync::Mutex;

use super::format::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{LinkEntry, LinkStatus, Log};

/// Emits through `tracing` and keeps per-dotfile outcomes for the summary.
#[derive(Debug, Default)]
pub struct Logger {
    entries: Mutex<Vec<LinkEntry>>,
    log_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct Tally {
    linked: usize,
    unchanged: usize,
    skipped: usize,
    dry_run: usize,
    failed: usize,
}

impl Tally {
    const fn add(&mut self, status: LinkStatus) {
        let slot = match status {
            LinkStatus::Linked => &mut self.linked,
            LinkStatus::AlreadyLinked => &mut self.unchanged,
            LinkStatus::Skipped => &mut self.skipped,
            LinkStatus::DryRun => &mut self.dry_run,
            LinkStatus::Failed => &mut self.failed,
        };
        *slot += 1;
    }

    const fn total(&self) -> usize {
        self.linked + self.unchanged + self.skipped + self.dry_run + self.failed
    }
}

impl Logger {
    /// Create a logger; `log_file` is only shown in the summary; the
    /// subscriber owns the file itself.
    #[must_use]
    pub fn new(log_file: Option<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// Where this run's log file lives.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Snapshot of the recorded outcomes.
    #[must_use]
    pub fn entries(&self) -> Vec<LinkEntry> {
        self.entries.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Number of dotfiles recorded as failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries().iter().filter(|e| e.status == LinkStatus::Failed).count()
    }

    /// Log one line per recorded dotfile, the totals, and the log file path.
    /// Nothing is printed when no dotfile was recorded.
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }
        self.stage("Summary");

        let mut tally = Tally::default();
        for entry in &entries {
            tally.add(entry.status);
            let (icon, color) = entry.status.marker();
            let detail = entry
                .message
                .as_deref()
                .map(|m| format!(" ({m})"))
                .unwrap_or_default();
            self.info(&format!("{color}{icon} {}{detail}\x1b[0m", entry.name));
        }

        self.info(&format!(
            "{} dotfiles: \x1b[32m{} linked\x1b[0m, \x1b[2m{} unchanged\x1b[0m, \x1b[33m{} skipped\x1b[0m, \x1b[37m{} dry-run\x1b[0m, \x1b[31m{} failed\x1b[0m",
            tally.total(),
            tally.linked,
            tally.unchanged,
            tally.skipped,
            tally.dry_run,
            tally.failed,
        ));
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }

    /// See [`Log::stage`].
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// See [`Log::info`].
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// See [`Log::debug`].
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// See [`Log::warn`].
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// See [`Log::error`].
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// See [`Log::dry_run`].
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// See [`Log::record`].
    pub fn record(&self, name: &str, status: LinkStatus, message: Option<&str>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LinkEntry {
                name: name.to_string(),
                status,
                message: message.map(str::to_string),
            });
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        Self::stage(self, msg);
    }

    fn info(&self, msg: &str) {
        Self::info(self, msg);
    }

    fn debug(&self, msg: &str) {
        Self::debug(self, msg);
    }

    fn warn(&self, msg: &str) {
        Self::warn(self, msg);
    }

    fn error(&self, msg: &str) {
        Self::error(self, msg);
    }

    fn dry_run(&self, msg: &str) {
        Self::dry_run(self, msg);
    }

    fn record(&self, name: &str, status: LinkStatus, message: Option<&str>) {
        Self::record(self, name, status, message);
    }
}
