use super::*;
use crate::logging::MemoryLog;
use crate::registry::MigrationEdge;
use cz_core::{ColumnDef, TableSchema};
use cz_db::pragmas::ConnectionFlag;
use cz_db::{SqliteBackend, Value};

// ── Helpers ────────────────────────────────────────────────────────────

fn v(n: u32) -> SchemaVersion {
    SchemaVersion::new(n)
}

/// `note(id, body)` at v3.
fn catalog() -> Catalog {
    let note = TableSchema::builder("note")
        .column(ColumnDef::integer("id").not_null())
        .column(
            ColumnDef::text("body")
                .not_null()
                .default(cz_core::DefaultValue::Text(String::new())),
        )
        .primary_key(&["id"])
        .build()
        .unwrap();
    Catalog::new(v(3), vec![note]).unwrap()
}

fn create_note(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
    ctx.execute("CREATE TABLE note (id INTEGER NOT NULL, PRIMARY KEY(id))")?;
    ctx.execute("INSERT INTO note (id) VALUES (1)")?;
    Ok(())
}

fn add_body(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
    ctx.ensure_column("note", "body")?;
    Ok(())
}

fn mark_post(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
    ctx.log().info("post-migrate");
    Ok(())
}

fn fail_after_write(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
    ctx.execute("CREATE TABLE scratch (id INTEGER)")?;
    ctx.execute("INSERT INTO nowhere VALUES (1)")?;
    Ok(())
}

fn orphan_row(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
    ctx.execute(
        "CREATE TABLE child (id INTEGER PRIMARY KEY, noteId INTEGER REFERENCES note(id))",
    )?;
    ctx.execute("INSERT INTO child (noteId) VALUES (99)")?;
    Ok(())
}

fn registry() -> MigrationRegistry {
    MigrationRegistry::new()
        .with(MigrationEdge::new(1, 2, "create note", create_note))
        .unwrap()
        .with(MigrationEdge::new(2, 3, "add body", add_body).with_post_migrate(mark_post))
        .unwrap()
}

fn fk_on(db: &SqliteBackend) -> bool {
    pragmas::flag(db, ConnectionFlag::ForeignKeys).unwrap()
}

// ── Runs ───────────────────────────────────────────────────────────────

#[test]
fn test_chain_applies_and_stamps_version() {
    let db = SqliteBackend::in_memory().unwrap();
    pragmas::set_user_version(&db, v(1)).unwrap();
    let (registry, catalog, log) = (registry(), catalog(), MemoryLog::new());

    let summary = MigrationRunner::new(&db, &registry, &catalog, &log)
        .run(v(1), v(3))
        .unwrap();

    assert_eq!(summary.path, PathKind::Chain);
    assert_eq!(summary.edges, vec!["v1 -> v2", "v2 -> v3"]);
    assert_eq!(pragmas::user_version(&db).unwrap(), v(3));
    assert_eq!(
        db.query_value("SELECT body FROM note WHERE id = 1").unwrap(),
        Some(Value::Text(String::new()))
    );
    assert!(log.contains(log::Level::Info, "post-migrate"));
    assert!(fk_on(&db));
}

#[test]
fn test_same_version_is_a_no_op() {
    let db = SqliteBackend::in_memory().unwrap();
    let (registry, catalog, log) = (registry(), catalog(), MemoryLog::new());
    let summary = MigrationRunner::new(&db, &registry, &catalog, &log)
        .run(v(3), v(3))
        .unwrap();
    assert_eq!(summary.path, PathKind::Current);
    assert!(summary.edges.is_empty());
    assert!(log.entries().is_empty());
}

#[test]
fn test_missing_path_touches_nothing() {
    let db = SqliteBackend::in_memory().unwrap();
    let (registry, catalog, log) = (registry(), catalog(), MemoryLog::new());
    let err = MigrationRunner::new(&db, &registry, &catalog, &log)
        .run(v(0), v(3))
        .unwrap_err();
    assert!(err.is_no_path());
    assert!(pragmas::user_tables(&db).unwrap().is_empty());
}

#[test]
fn test_failing_edge_rolls_back_whole_run() {
    let db = SqliteBackend::in_memory().unwrap();
    pragmas::set_user_version(&db, v(1)).unwrap();
    let registry = MigrationRegistry::new()
        .with(MigrationEdge::new(1, 2, "create note", create_note))
        .unwrap()
        .with(MigrationEdge::new(2, 3, "explode", fail_after_write))
        .unwrap();
    let (catalog, log) = (catalog(), MemoryLog::new());

    let err = MigrationRunner::new(&db, &registry, &catalog, &log)
        .run(v(1), v(3))
        .unwrap_err();

    match &err {
        MigrateError::EdgeBody { from, to, source } => {
            assert_eq!((*from, *to), (v(2), v(3)));
            assert!(matches!(**source, MigrateError::Db(_)));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(err.root(), MigrateError::Db(_)));
    assert!(!err.is_no_path());
    assert_eq!(pragmas::user_version(&db).unwrap(), v(1));
    assert!(pragmas::user_tables(&db).unwrap().is_empty());
    assert!(!db.in_transaction());
    assert!(fk_on(&db), "foreign keys restored on the error path");
    assert!(log.contains(log::Level::Error, "failed"));
}

#[test]
fn test_refuses_to_run_inside_transaction() {
    let db = SqliteBackend::in_memory().unwrap();
    let (registry, catalog, log) = (registry(), catalog(), MemoryLog::new());
    db.execute_batch("BEGIN").unwrap();
    let err = MigrationRunner::new(&db, &registry, &catalog, &log)
        .run(v(1), v(3))
        .unwrap_err();
    assert!(matches!(err, MigrateError::Transaction(_)));
    db.execute_batch("ROLLBACK").unwrap();
}

#[test]
fn test_verification_failure_rolls_back() {
    let db = SqliteBackend::in_memory().unwrap();
    pragmas::set_user_version(&db, v(1)).unwrap();
    let registry = MigrationRegistry::new()
        .with(MigrationEdge::new(1, 3, "forgets body", create_note))
        .unwrap();
    let (catalog, log) = (catalog(), MemoryLog::new());

    let err = MigrationRunner::new(&db, &registry, &catalog, &log)
        .run(v(1), v(3))
        .unwrap_err();
    match err {
        MigrateError::ValidationFailed { mismatches } => {
            assert_eq!(mismatches, vec!["note: missing columns body"]);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(pragmas::user_version(&db).unwrap(), v(1));
}

#[test]
fn test_verification_can_be_disabled() {
    let db = SqliteBackend::in_memory().unwrap();
    pragmas::set_user_version(&db, v(1)).unwrap();
    let registry = MigrationRegistry::new()
        .with(MigrationEdge::new(1, 3, "forgets body", create_note))
        .unwrap();
    let (catalog, log) = (catalog(), MemoryLog::new());

    MigrationRunner::new(&db, &registry, &catalog, &log)
        .verify_after_migrate(false)
        .run(v(1), v(3))
        .unwrap();
    assert_eq!(pragmas::user_version(&db).unwrap(), v(3));
}

#[test]
fn test_foreign_key_violations_are_warned_not_fatal() {
    let db = SqliteBackend::in_memory().unwrap();
    pragmas::set_user_version(&db, v(1)).unwrap();
    let registry = MigrationRegistry::new()
        .with(MigrationEdge::new(1, 2, "create note", create_note))
        .unwrap()
        .with(MigrationEdge::new(2, 3, "orphan", orphan_row))
        .unwrap();
    let (catalog, log) = (catalog(), MemoryLog::new());

    let summary = MigrationRunner::new(&db, &registry, &catalog, &log)
        .verify_after_migrate(false)
        .run(v(1), v(3))
        .unwrap();
    assert_eq!(summary.foreign_key_violations, 1);
    assert!(log.contains(log::Level::Warn, "child row 1 references missing note"));
}

#[test]
fn test_column_failures_in_edges_are_reported() {
    fn add_timestamp(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
        let outcome = ctx.ensure_column("note", "stamp")?;
        assert!(outcome.is_failed());
        Ok(())
    }

    let note = TableSchema::builder("note")
        .column(ColumnDef::integer("id").not_null())
        .column(ColumnDef::text("stamp").default(cz_core::DefaultValue::CurrentTimestamp))
        .primary_key(&["id"])
        .build()
        .unwrap();
    let catalog = Catalog::new(v(3), vec![note]).unwrap();
    let registry = MigrationRegistry::new()
        .with(MigrationEdge::new(1, 2, "create note", create_note))
        .unwrap()
        .with(MigrationEdge::new(2, 3, "stamp", add_timestamp))
        .unwrap();
    let db = SqliteBackend::in_memory().unwrap();
    let log = MemoryLog::new();

    let summary = MigrationRunner::new(&db, &registry, &catalog, &log)
        .verify_after_migrate(false)
        .run(v(1), v(3))
        .unwrap();
    assert_eq!(summary.repair.column_failures.len(), 1);
    assert_eq!(summary.repair.column_failures[0].column, "stamp");
    assert!(log.contains(log::Level::Error, "note.stamp"));
}
