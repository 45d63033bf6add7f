//! `archutil` command-line entry point.
use anyhow::Result;
use clap::Parser;

use archutil::cli::{Cli, Command};
use archutil::commands;
use archutil::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    if matches!(args.command, Command::Version) {
        let version = option_env!("ARCHUTIL_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
        #[allow(clippy::print_stdout)]
        {
            println!("archutil {version}");
        }
        return Ok(());
    }

    init_subscriber(args.verbose, args.command.name());
    let log = Logger::new(args.command.name());

    match &args.command {
        Command::Install(opts) => commands::install::run(&args.global, opts, &log),
        Command::List(opts) => commands::list::run(&args.global, opts, &log),
        Command::Config(opts) => commands::config::run(&args.global, opts, &log),
        Command::Version => Ok(()),
    }
}
