use super::*;
use cz_core::{ColumnDef, DefaultValue};
use cz_db::{SqliteBackend, Value};

fn song_db() -> SqliteBackend {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE song (id TEXT NOT NULL, title TEXT NOT NULL, PRIMARY KEY(id));
         INSERT INTO song VALUES ('a', 'Blackbird');",
    )
    .unwrap();
    db
}

fn song() -> TableName {
    TableName::try_new("song").unwrap()
}

#[test]
fn test_adds_missing_column_with_default() {
    let db = song_db();
    let spec = ColumnDef::integer("explicit")
        .not_null()
        .default_int(0)
        .into_spec()
        .unwrap();

    let outcome = ColumnPatcher::new(&db).ensure_column(&song(), &spec).unwrap();
    assert_eq!(outcome, PatchOutcome::Added);
    assert_eq!(
        db.query_value("SELECT explicit FROM song WHERE id = 'a'")
            .unwrap(),
        Some(Value::Integer(0))
    );
}

#[test]
fn test_second_call_is_already_present() {
    let db = song_db();
    let spec = ColumnDef::text("albumName").into_spec().unwrap();
    let patcher = ColumnPatcher::new(&db);

    assert_eq!(
        patcher.ensure_column(&song(), &spec).unwrap(),
        PatchOutcome::Added
    );
    assert_eq!(
        patcher.ensure_column(&song(), &spec).unwrap(),
        PatchOutcome::AlreadyPresent
    );
}

#[test]
fn test_presence_is_case_insensitive() {
    let db = song_db();
    let spec = ColumnDef::text("TITLE").not_null().into_spec().unwrap();
    assert_eq!(
        ColumnPatcher::new(&db).ensure_column(&song(), &spec).unwrap(),
        PatchOutcome::AlreadyPresent
    );
}

#[test]
fn test_non_constant_default_fails_without_error() {
    let db = song_db();
    let spec = ColumnDef::text("addedAt")
        .default(DefaultValue::CurrentTimestamp)
        .into_spec()
        .unwrap();

    let outcome = ColumnPatcher::new(&db).ensure_column(&song(), &spec).unwrap();
    match outcome {
        PatchOutcome::Failed(reason) => assert!(reason.contains("non-constant default")),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn test_required_column_without_default_fails_on_populated_table() {
    let db = song_db();
    let spec = ColumnDef::integer("duration").not_null().into_spec().unwrap();
    let outcome = ColumnPatcher::new(&db).ensure_column(&song(), &spec).unwrap();
    assert!(outcome.is_failed());
}

#[test]
fn test_missing_table_is_failed() {
    let db = SqliteBackend::in_memory().unwrap();
    let spec = ColumnDef::text("albumName").into_spec().unwrap();
    let outcome = ColumnPatcher::new(&db).ensure_column(&song(), &spec).unwrap();
    assert!(outcome.is_failed());
}
