use super::*;
use crate::diff::classify;
use cz_core::{ColumnDef, IndexDef};
use cz_db::{SqliteBackend, Value};

// ── Helpers ────────────────────────────────────────────────────────────

fn song_schema() -> TableSchema {
    TableSchema::builder("song")
        .column(ColumnDef::text("id").not_null())
        .column(ColumnDef::text("title").not_null())
        .column(
            ColumnDef::integer("duration")
                .not_null()
                .fallback(cz_core::DefaultValue::Integer(-1)),
        )
        .column(ColumnDef::integer("liked").not_null().default_int(0))
        .column(ColumnDef::integer("totalPlayTime").not_null().default_int(0))
        .column(ColumnDef::integer("explicit").not_null().default_int(0))
        .column(ColumnDef::integer("isLocal").not_null().default_int(0))
        .primary_key(&["id"])
        .index(IndexDef::on(&["title"]))
        .build()
        .unwrap()
}

fn live_names(db: &SqliteBackend, table: &str) -> Vec<String> {
    SchemaIntrospector::new(db)
        .describe(table)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect()
}

fn user_tables(db: &SqliteBackend) -> Vec<String> {
    pragmas::user_tables(db).unwrap()
}

fn scalar(db: &SqliteBackend, sql: &str) -> Value {
    db.query_value(sql).unwrap().unwrap_or(Value::Null)
}

/// Connection with foreign-key enforcement off, as the repair guard leaves it.
fn memory_db() -> SqliteBackend {
    let db = SqliteBackend::in_memory().unwrap();
    pragmas::set_flag(&db, ConnectionFlag::ForeignKeys, false).unwrap();
    db
}

fn legacy_song_db() -> SqliteBackend {
    let db = memory_db();
    db.execute_batch(
        "CREATE TABLE song (
            id TEXT NOT NULL,
            title TEXT NOT NULL,
            liked INTEGER NOT NULL,
            totalPlayTime INTEGER,
            PRIMARY KEY(id)
         );
         CREATE INDEX song_title_legacy ON song (title);
         INSERT INTO song VALUES ('a', 'Blackbird', 1, 300);
         INSERT INTO song VALUES ('b', 'Yesterday', 0, NULL);
         INSERT INTO song VALUES ('c', 'Help!', 1, 42);",
    )
    .unwrap();
    db
}

// ── Rebuild ────────────────────────────────────────────────────────────

#[test]
fn test_rebuild_preserves_rows_and_fills_new_columns() {
    let db = legacy_song_db();
    let existing = live_names(&db, "song");

    let copied = TableRebuilder::new(&db)
        .rebuild(&song_schema(), &existing)
        .unwrap();
    assert_eq!(copied, 3);

    let rows = db
        .query("SELECT id, title, duration, liked, totalPlayTime, explicit, isLocal FROM song ORDER BY id")
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].str_at(1).unwrap(), "Blackbird");
    assert_eq!(rows[0].i64_at(2).unwrap(), -1);
    assert_eq!(rows[0].i64_at(3).unwrap(), 1);
    assert_eq!(rows[0].i64_at(4).unwrap(), 300);
    assert_eq!(rows[1].i64_at(4).unwrap(), 0, "NULL coalesced to default");
    assert_eq!(rows[2].i64_at(4).unwrap(), 42);
    for row in &rows {
        assert_eq!(row.i64_at(5).unwrap(), 0);
        assert_eq!(row.i64_at(6).unwrap(), 0);
    }
}

#[test]
fn test_rebuild_leaves_table_in_sync() {
    let db = legacy_song_db();
    let existing = live_names(&db, "song");
    TableRebuilder::new(&db)
        .rebuild(&song_schema(), &existing)
        .unwrap();

    let live = SchemaIntrospector::new(&db).describe("song").unwrap();
    assert!(classify(&song_schema(), &live).is_in_sync());

    let explicit = live.iter().find(|c| c.name == "explicit").unwrap();
    assert_eq!(explicit.default_literal.as_deref(), Some("0"));
    let is_local = live.iter().find(|c| c.name == "isLocal").unwrap();
    assert_eq!(is_local.default_literal.as_deref(), Some("0"));
}

#[test]
fn test_rebuild_replaces_indexes_and_drops_temp_table() {
    let db = legacy_song_db();
    let existing = live_names(&db, "song");
    TableRebuilder::new(&db)
        .rebuild(&song_schema(), &existing)
        .unwrap();

    assert_eq!(user_tables(&db), vec!["song"]);
    let indexes: Vec<String> = SchemaIntrospector::new(&db)
        .indexes("song")
        .unwrap()
        .into_iter()
        .filter(|i| i.explicit)
        .map(|i| i.name)
        .collect();
    assert_eq!(indexes, vec!["index_song_title"]);
}

#[test]
fn test_rebuild_drops_extra_columns() {
    let db = legacy_song_db();
    db.execute_batch("ALTER TABLE song ADD COLUMN scratch TEXT")
        .unwrap();
    let existing = live_names(&db, "song");
    TableRebuilder::new(&db)
        .rebuild(&song_schema(), &existing)
        .unwrap();
    assert!(!live_names(&db, "song").contains(&"scratch".to_string()));
}

#[test]
fn test_drifted_default_is_fixed_without_overwriting_values() {
    let db = memory_db();
    db.execute_batch(
        "CREATE TABLE playlist (id TEXT NOT NULL, name TEXT NOT NULL,
             isEditable INTEGER NOT NULL, PRIMARY KEY(id));
         INSERT INTO playlist VALUES ('p1', 'Mine', 1);
         INSERT INTO playlist VALUES ('p2', 'Album', 0);",
    )
    .unwrap();
    let desired = TableSchema::builder("playlist")
        .column(ColumnDef::text("id").not_null())
        .column(ColumnDef::text("name").not_null())
        .column(ColumnDef::integer("isEditable").not_null().default_int(1))
        .primary_key(&["id"])
        .build()
        .unwrap();

    let existing = live_names(&db, "playlist");
    TableRebuilder::new(&db).rebuild(&desired, &existing).unwrap();

    assert_eq!(
        scalar(&db, "SELECT isEditable FROM playlist WHERE id = 'p2'"),
        Value::Integer(0)
    );
    db.execute("INSERT INTO playlist (id, name) VALUES ('p3', 'New')")
        .unwrap();
    assert_eq!(
        scalar(&db, "SELECT isEditable FROM playlist WHERE id = 'p3'"),
        Value::Integer(1)
    );
}

#[test]
fn test_rebuild_of_parent_keeps_child_references() {
    let db = memory_db();
    db.execute_batch(
        "CREATE TABLE song (id TEXT NOT NULL, title TEXT NOT NULL, liked INTEGER NOT NULL,
             totalPlayTime INTEGER NOT NULL, PRIMARY KEY(id));
         CREATE TABLE song_artist_map (songId TEXT NOT NULL, artistId TEXT NOT NULL,
             position INTEGER NOT NULL, PRIMARY KEY(songId, artistId),
             FOREIGN KEY(songId) REFERENCES song(id) ON DELETE CASCADE);
         INSERT INTO song VALUES ('a', 'Blackbird', 0, 0);
         INSERT INTO song_artist_map VALUES ('a', 'x', 0);",
    )
    .unwrap();
    let existing = live_names(&db, "song");
    TableRebuilder::new(&db)
        .rebuild(&song_schema(), &existing)
        .unwrap();

    let child_sql = scalar(
        &db,
        "SELECT sql FROM sqlite_master WHERE name = 'song_artist_map'",
    );
    match child_sql {
        Value::Text(sql) => {
            assert!(sql.contains("REFERENCES song(id)"), "{sql}");
            assert!(!sql.contains("_old_"), "{sql}");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        scalar(&db, "SELECT COUNT(*) FROM song_artist_map"),
        Value::Integer(1)
    );
    assert!(pragmas::foreign_key_violations(&db).unwrap().is_empty());
}

// ── Failure paths ──────────────────────────────────────────────────────

#[test]
fn test_refuses_while_foreign_keys_enforced() {
    let db = legacy_song_db();
    pragmas::set_flag(&db, ConnectionFlag::ForeignKeys, true).unwrap();
    let existing = live_names(&db, "song");

    let err = TableRebuilder::new(&db)
        .rebuild(&song_schema(), &existing)
        .unwrap_err();
    assert!(matches!(
        err,
        MigrateError::RebuildFailure {
            phase: RebuildPhase::Prepare,
            ..
        }
    ));
    assert_eq!(live_names(&db, "song").len(), 4);
}

#[test]
fn test_failed_copy_restores_original_table() {
    let db = memory_db();
    db.execute_batch(
        "CREATE TABLE search_history (id INTEGER NOT NULL, query TEXT NOT NULL, PRIMARY KEY(id));
         INSERT INTO search_history (query) VALUES ('beatles'), ('beatles');",
    )
    .unwrap();
    let desired = TableSchema::builder("search_history")
        .column(ColumnDef::integer("id").not_null())
        .column(ColumnDef::text("query").not_null())
        .column(ColumnDef::integer("searchedAt"))
        .primary_key(&["id"])
        .index(IndexDef::on(&["query"]).unique())
        .build()
        .unwrap();
    let existing = live_names(&db, "search_history");

    let err = TableRebuilder::new(&db)
        .rebuild(&desired, &existing)
        .unwrap_err();
    match err {
        MigrateError::RebuildFailure { table, phase, .. } => {
            assert_eq!(table, "search_history");
            assert_eq!(phase, RebuildPhase::Copy);
        }
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(user_tables(&db), vec!["search_history"]);
    assert_eq!(live_names(&db, "search_history"), vec!["id", "query"]);
    assert_eq!(
        scalar(&db, "SELECT COUNT(*) FROM search_history"),
        Value::Integer(2)
    );
    assert!(!db.in_transaction());
}

const SONG_WITH_ARTISTS: &str =
    "CREATE TABLE song (id TEXT NOT NULL, title TEXT NOT NULL, liked INTEGER NOT NULL,
         totalPlayTime INTEGER NOT NULL, PRIMARY KEY(id));
     CREATE TABLE song_artist_map (songId TEXT NOT NULL, artistId TEXT NOT NULL,
         position INTEGER NOT NULL, PRIMARY KEY(songId, artistId),
         FOREIGN KEY(songId) REFERENCES song(id) ON DELETE CASCADE);
     INSERT INTO song VALUES ('a', 'Blackbird', 0, 0);
     INSERT INTO song VALUES ('b', 'Julia', 0, 0);
     INSERT INTO song_artist_map VALUES ('a', 'x', 0);";

fn assert_child_references_song(db: &SqliteBackend) {
    match scalar(db, "SELECT sql FROM sqlite_master WHERE name = 'song_artist_map'") {
        Value::Text(sql) => {
            assert!(sql.contains("REFERENCES song(id)"), "{sql}");
            assert!(!sql.contains("_old_"), "{sql}");
        }
        other => panic!("unexpected {other:?}"),
    }
    db.execute("INSERT INTO song_artist_map VALUES ('b', 'y', 0)")
        .unwrap();
}

#[test]
fn test_refuses_parent_rebuild_when_keys_are_only_deferred() {
    let db = memory_db();
    db.execute_batch(SONG_WITH_ARTISTS).unwrap();
    pragmas::set_flag(&db, ConnectionFlag::ForeignKeys, true).unwrap();
    db.execute_batch("BEGIN IMMEDIATE").unwrap();
    let err = {
        let fk = crate::ForeignKeyGuard::suspend(&db).unwrap();
        assert!(fk.is_deferred());
        let existing = live_names(&db, "song");
        TableRebuilder::new(&db)
            .rebuild(&song_schema(), &existing)
            .unwrap_err()
    };
    db.execute_batch("COMMIT").unwrap();

    assert!(matches!(
        err,
        MigrateError::RebuildFailure {
            phase: RebuildPhase::Prepare,
            ..
        }
    ));
    assert_eq!(user_tables(&db), vec!["song", "song_artist_map"]);
    assert_eq!(live_names(&db, "song").len(), 4);
    assert_child_references_song(&db);
}

#[test]
fn test_parent_rebuild_inside_transaction_with_keys_off() {
    let db = memory_db();
    db.execute_batch(SONG_WITH_ARTISTS).unwrap();
    pragmas::set_flag(&db, ConnectionFlag::ForeignKeys, false).unwrap();
    db.execute_batch("BEGIN IMMEDIATE").unwrap();
    {
        let _fk = crate::ForeignKeyGuard::suspend(&db).unwrap();
        let existing = live_names(&db, "song");
        TableRebuilder::new(&db)
            .rebuild(&song_schema(), &existing)
            .unwrap();
    }
    db.execute_batch("COMMIT").unwrap();
    pragmas::set_flag(&db, ConnectionFlag::ForeignKeys, true).unwrap();

    assert_eq!(scalar(&db, "SELECT COUNT(*) FROM song"), Value::Integer(2));
    assert_child_references_song(&db);
    assert!(pragmas::foreign_key_violations(&db).unwrap().is_empty());
}

// ── Copy statement ─────────────────────────────────────────────────────

#[test]
fn test_copy_sql_selects_coalesces_and_substitutes() {
    let desired = TableSchema::builder("album")
        .column(ColumnDef::text("id").not_null())
        .column(ColumnDef::text("title").not_null())
        .column(ColumnDef::integer("year"))
        .column(ColumnDef::integer("songCount").not_null())
        .column(ColumnDef::text("thumbnailUrl"))
        .primary_key(&["id"])
        .build()
        .unwrap();
    let existing = vec!["id".to_string(), "TITLE".to_string(), "year".to_string()];

    assert_eq!(
        copy_sql(&desired, &existing, "album_old_1"),
        "INSERT INTO \"album\" (\"id\", \"title\", \"year\", \"songCount\", \"thumbnailUrl\") \
         SELECT COALESCE(\"id\", ''), COALESCE(\"title\", ''), \"year\", 0, NULL \
         FROM \"album_old_1\""
    );
}
