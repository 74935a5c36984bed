use super::*;
use crate::diff::TablePlan;
use crate::logging::MemoryLog;
use crate::registry::PathKind;
use crate::repair::SchemaRepairEngine;
use cz_db::{Database, SqliteBackend};

#[test]
fn test_catalog_builds_in_dependency_order() {
    let catalog = catalog().unwrap();
    assert_eq!(catalog.version(), TARGET_VERSION);
    let names: Vec<&str> = catalog.tables().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "song",
            "artist",
            "album",
            "playlist",
            "song_artist_map",
            "playlist_song_map",
            "event",
            "format",
            "lyrics",
            "search_history",
        ]
    );
}

#[test]
fn test_fresh_tables_are_in_sync() {
    let catalog = catalog().unwrap();
    let db = SqliteBackend::in_memory().unwrap();
    for table in catalog.tables() {
        db.execute(&table.create_table_sql()).unwrap();
    }
    let log = MemoryLog::new();
    let plans = SchemaRepairEngine::new(&db, &log).plan_all(&catalog).unwrap();
    for (table, plan) in plans {
        assert_eq!(plan, TablePlan::InSync, "{table}");
    }
}

#[test]
fn test_song_defaults_render_unquoted() {
    let song = tables::song().unwrap();
    assert!(song
        .create_table_sql()
        .contains("\"explicit\" INTEGER NOT NULL DEFAULT 0"));
    assert!(song
        .create_table_sql()
        .contains("\"isLocal\" INTEGER NOT NULL DEFAULT 0"));
}

#[test]
fn test_every_older_version_has_a_path() {
    let registry = registry().unwrap();
    assert_eq!(registry.latest(), Some(TARGET_VERSION));
    for from in 0..TARGET_VERSION.get() {
        assert!(
            registry.supports(SchemaVersion::new(from), TARGET_VERSION),
            "v{from}"
        );
    }
}

#[test]
fn test_historical_versions_avoid_catch_all() {
    let registry = registry().unwrap();
    let kinds: Vec<PathKind> = (0..5)
        .map(|from| {
            registry
                .select(SchemaVersion::new(from), TARGET_VERSION)
                .unwrap()
                .kind
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            PathKind::CatchAll,
            PathKind::Chain,
            PathKind::Chain,
            PathKind::Exact,
            PathKind::Exact,
        ]
    );
}

#[test]
fn test_skip_edge_preferred_from_v3() {
    let registry = registry().unwrap();
    let edges = registry
        .edges_for(SchemaVersion::new(3), TARGET_VERSION)
        .unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].to_string(), "v3 -> v5");
    assert!(edges[0].has_post_migrate());
}
