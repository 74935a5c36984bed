//! Cadenza CLI - schema status, migration and repair for a library database

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::common::ExitCode;
use commands::{inspect, migrate, repair, status};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let result = match &cli.command {
        cli::Commands::Status(args) => status::execute(args, &cli.global),
        cli::Commands::Migrate(args) => migrate::execute(args, &cli.global),
        cli::Commands::Repair(args) => repair::execute(args, &cli.global),
        cli::Commands::Inspect(args) => inspect::execute(args, &cli.global),
    };
    std::process::exit(exit_code(result));
}

fn init_logging(verbose: bool) {
    let mut builder = colog::default_builder();
    builder.filter(
        None,
        if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        },
    );
    builder.init();
}

fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            if let Some(code) = e.downcast_ref::<ExitCode>() {
                return code.0;
            }
            eprintln!("Error: {e:#}");
            1
        }
    }
}
