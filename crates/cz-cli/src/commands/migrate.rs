//! Migrate command implementation

use anyhow::{Context, Result};
use cz_migrate::{OpenOutcome, RepairReport, Store};
use serde::Serialize;

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::{load_settings, print_json, CommandLog, LogLine};

#[derive(Serialize)]
struct MigrateOutput<'a> {
    database: String,
    outcome: &'a OpenOutcome,
    log: Vec<LogLine>,
}

/// Execute the migrate command
pub(crate) fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let mut settings = load_settings(global)?;
    let policy = &mut settings.config.migration;
    policy.fallback_to_destructive |= args.allow_destructive;
    policy.fallback_on_downgrade |= args.allow_downgrade;
    if args.no_verify {
        policy.verify_after_migrate = false;
    }

    let database = settings.database_path().display().to_string();
    let log = CommandLog::new(global);
    let store = Store::open(&settings.config, &settings.root, &log)
        .with_context(|| format!("Failed to migrate {database}"))?;

    if global.json {
        return print_json(&MigrateOutput {
            database,
            outcome: store.outcome(),
            log: log.entries(),
        });
    }

    match store.outcome() {
        OpenOutcome::Created { version } => println!("Created {database} at {version}"),
        OpenOutcome::UpToDate { version } => println!("{database} is up to date ({version})"),
        OpenOutcome::Migrated(summary) => {
            println!(
                "Migrated {database} from {} to {} via {}",
                summary.from, summary.to, summary.path
            );
            for edge in &summary.edges {
                println!("  {edge}");
            }
            print_repair(&summary.repair);
            if summary.foreign_key_violations > 0 {
                println!(
                    "  {} foreign key violation(s) left in place",
                    summary.foreign_key_violations
                );
            }
        }
        OpenOutcome::Recreated { from, to, reason } => {
            println!("Recreated {database} at {to} (was {from}): {reason}");
        }
    }
    Ok(())
}

pub(crate) fn print_repair(report: &RepairReport) {
    if report.is_clean() && report.rows_normalized == 0 {
        return;
    }
    println!(
        "  {} table(s) patched, {} rebuilt, {} value(s) normalized",
        report.tables_patched, report.tables_rebuilt, report.rows_normalized
    );
    for failure in &report.column_failures {
        println!(
            "  could not add {}.{}: {}",
            failure.table, failure.column, failure.reason
        );
    }
}
