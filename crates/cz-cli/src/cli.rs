//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// Cadenza - schema migration and repair for the music library database
#[derive(Parser, Debug)]
#[command(name = "cadenza")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to cadenza.yml (default: ./cadenza.yml when present)
    #[arg(short, long, global = true, env = "CADENZA_CONFIG")]
    pub config: Option<String>,

    /// Override the database path from the config
    #[arg(short, long, global = true, env = "CADENZA_DATABASE")]
    pub database: Option<String>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the on-disk version, the upgrade path and per-table drift
    Status(StatusArgs),

    /// Open the database, migrating it to the current version
    Migrate(MigrateArgs),

    /// Run the self-healing repair pass on a current database
    Repair(RepairArgs),

    /// Show the live columns and indexes of one table
    Inspect(InspectArgs),
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Exit with code 2 when the database needs migration or repair
    #[arg(long)]
    pub check: bool,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Drop and recreate the database when no upgrade path exists
    #[arg(long)]
    pub allow_destructive: bool,

    /// Also allow recreation when the file is newer than this build
    #[arg(long)]
    pub allow_downgrade: bool,

    /// Skip the post-migration schema check
    #[arg(long)]
    pub no_verify: bool,
}

/// Arguments for the repair command
#[derive(Args, Debug)]
pub struct RepairArgs {
    /// Print the repair plan without writing
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Table to inspect
    pub table: String,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
