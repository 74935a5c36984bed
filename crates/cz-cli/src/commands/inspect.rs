//! Inspect command implementation

use anyhow::{bail, Result};
use cz_migrate::{
    app, LiveColumnInfo, LiveIndexInfo, SchemaIntrospector, SchemaRepairEngine, TablePlan,
};
use serde::Serialize;

use crate::cli::{GlobalArgs, InspectArgs};
use crate::commands::common::{
    connect_existing, describe_plan, load_settings, print_json, CommandLog,
};

#[derive(Serialize)]
struct InspectOutput<'a> {
    table: &'a str,
    columns: Vec<LiveColumnInfo>,
    indexes: Vec<LiveIndexInfo>,
    /// Present for tables the library schema defines.
    plan: Option<TablePlan>,
}

/// Execute the inspect command
pub(crate) fn execute(args: &InspectArgs, global: &GlobalArgs) -> Result<()> {
    let settings = load_settings(global)?;
    let db = connect_existing(&settings)?;
    let introspector = SchemaIntrospector::new(&db);

    let columns = introspector.describe(&args.table)?;
    if columns.is_empty() {
        bail!("Table '{}' does not exist", args.table);
    }
    let indexes = introspector.indexes(&args.table)?;

    let catalog = app::catalog()?;
    let log = CommandLog::new(global);
    let plan = match catalog.table(&args.table) {
        Some(desired) => Some(SchemaRepairEngine::new(&db, &log).plan(desired)?),
        None => None,
    };

    if global.json {
        return print_json(&InspectOutput {
            table: &args.table,
            columns,
            indexes,
            plan,
        });
    }

    println!("Table: {}", args.table);
    let width = columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
    for col in &columns {
        let mut line = format!("  {:<width$}  {}", col.name, col.sql_type);
        if col.not_null {
            line.push_str(" NOT NULL");
        }
        if let Some(default) = &col.default_literal {
            line.push_str(&format!(" DEFAULT {default}"));
        }
        if col.pk_position > 0 {
            line.push_str(&format!("  [pk {}]", col.pk_position));
        }
        println!("{line}");
    }

    for index in indexes.iter().filter(|i| i.explicit) {
        let unique = if index.unique { "unique " } else { "" };
        println!("  {unique}index {}", index.name);
    }

    match &plan {
        Some(plan) => println!("Plan: {}", describe_plan(plan)),
        None => println!("Plan: not part of the library schema"),
    }
    Ok(())
}
