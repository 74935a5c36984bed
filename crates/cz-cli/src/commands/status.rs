//! Status command implementation

use anyhow::Result;
use cz_core::SchemaVersion;
use cz_db::pragmas;
use cz_migrate::{app, PathKind, SchemaRepairEngine, TablePlan};
use serde::Serialize;

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::{
    connect_existing, describe_plan, load_settings, print_json, CommandLog, ExitCode,
};

#[derive(Debug, Serialize)]
struct StatusReport {
    database: String,
    on_disk: SchemaVersion,
    target: SchemaVersion,
    /// `None` when no in-place path exists.
    path: Option<PathKind>,
    edges: Vec<String>,
    /// Whether explicit edges alone connect the versions.
    explicit_path: bool,
    tables: Vec<TableStatus>,
}

#[derive(Debug, Serialize)]
struct TableStatus {
    table: String,
    plan: TablePlan,
}

impl StatusReport {
    fn needs_attention(&self) -> bool {
        self.on_disk != self.target || self.tables.iter().any(|t| !t.plan.is_in_sync())
    }
}

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let settings = load_settings(global)?;
    let db = connect_existing(&settings)?;
    let catalog = app::catalog()?;
    let registry = app::registry()?;
    let log = CommandLog::new(global);

    let on_disk = pragmas::user_version(&db)?;
    let target = catalog.version();
    let (path, edges) = match registry.select(on_disk, target) {
        Ok(path) => (
            Some(path.kind),
            path.edges.iter().map(|e| e.to_string()).collect(),
        ),
        Err(e) => {
            log::debug!("{e}");
            (None, Vec::new())
        }
    };

    let tables = SchemaRepairEngine::new(&db, &log)
        .plan_all(&catalog)?
        .into_iter()
        .map(|(table, plan)| TableStatus { table, plan })
        .collect();

    let report = StatusReport {
        database: settings.database_path().display().to_string(),
        on_disk,
        target,
        path,
        edges,
        explicit_path: registry.explicit_path_exists(on_disk, target),
        tables,
    };

    if global.json {
        print_json(&report)?;
    } else {
        print_text(&report);
    }

    if args.check && report.needs_attention() {
        return Err(ExitCode(2).into());
    }
    Ok(())
}

fn print_text(report: &StatusReport) {
    println!("Database: {}", report.database);
    println!("Version:  {} (current {})", report.on_disk, report.target);
    match report.path {
        Some(PathKind::Current) => println!("Path:     up to date"),
        Some(kind) => println!("Path:     {kind} ({})", report.edges.join(", ")),
        None => println!("Path:     none (recreation required)"),
    }
    if report.path == Some(PathKind::CatchAll) && !report.explicit_path {
        println!("          only the catch-all edge reaches {}", report.target);
    }
    println!();

    let width = report
        .tables
        .iter()
        .map(|t| t.table.len())
        .max()
        .unwrap_or(0);
    for t in &report.tables {
        println!("  {:<width$}  {}", t.table, describe_plan(&t.plan));
    }
}
