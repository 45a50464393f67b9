//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the dotfiles bootstrapper.
#[derive(Parser, Debug)]
#[command(
    name = "nvs",
    about = "Find, clone, and link your dotfiles into $HOME",
    version = env!("NVS_VERSION")
)]
pub struct Cli {
    /// Subcommand to run; `init` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Global options.
    #[command(flatten)]
    pub global: GlobalOpts,
}

impl Cli {
    /// The subcommand to run, with `init` as the default.
    #[must_use]
    pub fn subcommand(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Init(InitOpts { path: None }))
    }
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Answer every prompt with its default (backup conflicts, confirm)
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Override the home directory links are created in
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Find or choose a dotfiles directory and link it
    Init(InitOpts),
    /// Clone a GitHub repository and link its dotfiles
    Add(AddOpts),
    /// Show recorded links and repositories
    Status(StatusOpts),
    /// Remove symlinks created by nvs
    Unlink(UnlinkOpts),
    /// Pull every recorded repository
    Update,
}

impl Command {
    /// Name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Add(_) => "add",
            Self::Status(_) => "status",
            Self::Unlink(_) => "unlink",
            Self::Update => "update",
        }
    }
}

/// Options for the `init` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InitOpts {
    /// Dotfiles directory; detected or asked for when omitted
    pub path: Option<String>,
}

/// Options for the `add` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct AddOpts {
    /// Repository as owner/repo or a GitHub URL
    pub repo: String,
}

/// Options for the `status` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct StatusOpts {
    /// Fetch each repository before comparing with its upstream
    #[arg(long)]
    pub fetch: bool,
}

/// Options for the `unlink` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct UnlinkOpts {
    /// Link targets to remove; every recorded link when omitted
    pub targets: Vec<PathBuf>,
}
