//! Repair command implementation

use anyhow::{Context, Result};
use cz_migrate::{app, OpenOutcome, RepairReport, SchemaRepairEngine, Store, TablePlan};
use serde::Serialize;

use crate::cli::{GlobalArgs, RepairArgs};
use crate::commands::common::{
    connect_existing, describe_plan, load_settings, print_json, CommandLog, LogLine,
};
use crate::commands::migrate::print_repair;

#[derive(Serialize)]
struct RepairOutput {
    database: String,
    report: RepairReport,
    log: Vec<LogLine>,
}

#[derive(Serialize)]
struct PlanOutput {
    database: String,
    tables: Vec<PlannedTable>,
}

#[derive(Serialize)]
struct PlannedTable {
    table: String,
    plan: TablePlan,
}

/// Execute the repair command
pub(crate) fn execute(args: &RepairArgs, global: &GlobalArgs) -> Result<()> {
    let settings = load_settings(global)?;
    let database = settings.database_path().display().to_string();
    let log = CommandLog::new(global);

    if args.dry_run {
        let db = connect_existing(&settings)?;
        let plans = SchemaRepairEngine::new(&db, &log).plan_all(&app::catalog()?)?;
        if global.json {
            let tables = plans
                .into_iter()
                .map(|(table, plan)| PlannedTable { table, plan })
                .collect();
            return print_json(&PlanOutput { database, tables });
        }
        println!("Dry run - repair plan for {database}:");
        for (table, plan) in plans.iter().filter(|(_, p)| !p.is_in_sync()) {
            println!("  {table}: {}", describe_plan(plan));
        }
        if plans.iter().all(|(_, p)| p.is_in_sync()) {
            println!("  nothing to repair");
        }
        return Ok(());
    }

    let store = Store::open(&settings.config, &settings.root, &log)
        .with_context(|| format!("Failed to open {database}"))?;
    if let OpenOutcome::Migrated(summary) = store.outcome() {
        log::info!("Migrated {} -> {} before repairing", summary.from, summary.to);
    }
    let report = store
        .repair(&log)
        .with_context(|| format!("Failed to repair {database}"))?;

    if global.json {
        return print_json(&RepairOutput {
            database,
            report,
            log: log.entries(),
        });
    }
    if report.is_clean() && report.rows_normalized == 0 {
        println!("{database}: schema matches, nothing repaired");
    } else {
        println!("Repaired {database}");
        print_repair(&report);
    }
    Ok(())
}
