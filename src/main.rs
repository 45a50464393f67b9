//! `nvs` command-line entry point.
use anyhow::Result;
use clap::Parser;

use nvs_cli::cli::{Cli, Command};
use nvs_cli::commands::{self, Context};
use nvs_cli::exec::SystemExecutor;
use nvs_cli::logging::{self, Logger};
use nvs_cli::operations::SystemFileSystemOps;
use nvs_cli::prompt::{AutoPrompter, InquirePrompter, Prompter};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let command = args.subcommand();

    let log_file = logging::log_file_path(command.name());
    logging::init_subscriber(args.verbose, command.name(), log_file.as_deref());
    let log = Logger::new(log_file);

    let home = commands::resolve_home(&args.global)?;
    let inquire = InquirePrompter::new(&home);
    let prompter: &dyn Prompter = if args.global.yes {
        &AutoPrompter
    } else {
        &inquire
    };
    let ctx = Context::new(
        home,
        args.global.dry_run,
        &SystemFileSystemOps,
        &SystemExecutor,
        prompter,
        &log,
    );

    match &command {
        Command::Init(opts) => commands::init::run(opts, &ctx),
        Command::Add(opts) => commands::add::run(opts, &ctx),
        Command::Status(opts) => commands::status::run(opts, &ctx),
        Command::Unlink(opts) => commands::unlink::run(opts, &ctx),
        Command::Update => commands::update::run(&ctx),
    }
}
