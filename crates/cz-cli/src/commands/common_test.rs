use super::*;
use cz_migrate::RebuildReason;
use tempfile::TempDir;

// ── Helpers ────────────────────────────────────────────────────────────

fn global() -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        config: None,
        database: None,
        json: true,
    }
}

// ── Settings ───────────────────────────────────────────────────────────

#[test]
fn test_explicit_config_resolves_database_next_to_it() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cadenza.yml");
    std::fs::write(&path, "database:\n  path: music.db\n").unwrap();

    let settings = load_settings(&GlobalArgs {
        config: Some(path.display().to_string()),
        ..global()
    })
    .unwrap();

    assert_eq!(settings.root, dir.path());
    assert_eq!(settings.database_path(), dir.path().join("music.db"));
}

#[test]
fn test_database_flag_overrides_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cadenza.yml");
    std::fs::write(&path, "database:\n  path: music.db\n").unwrap();

    let settings = load_settings(&GlobalArgs {
        config: Some(path.display().to_string()),
        database: Some(":memory:".to_string()),
        ..global()
    })
    .unwrap();
    assert!(settings.config.is_in_memory());
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = load_settings(&GlobalArgs {
        config: Some(dir.path().join("nope.yml").display().to_string()),
        ..global()
    });
    assert!(result.is_err());
}

#[test]
fn test_read_only_commands_do_not_create_files() {
    let dir = TempDir::new().unwrap();
    let settings = Settings {
        config: Config::default(),
        root: dir.path().to_path_buf(),
    };
    let err = connect_existing(&settings).err().unwrap();
    assert!(err.to_string().contains("Database not found"));
    assert!(!dir.path().join("library.db").exists());
}

// ── Output ─────────────────────────────────────────────────────────────

#[test]
fn test_command_log_records_lowercase_levels() {
    let log = CommandLog::new(&global());
    log.info("one");
    log.warn("two");
    let entries = log.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].level, "info");
    assert_eq!(entries[1].level, "warn");
    assert_eq!(entries[1].message, "two");
}

#[test]
fn test_plans_are_described_in_one_line() {
    assert_eq!(describe_plan(&TablePlan::InSync), "in sync");
    assert_eq!(
        describe_plan(&TablePlan::Patch {
            columns: vec!["explicit".into(), "isLocal".into()]
        }),
        "patch: add explicit, isLocal"
    );
    let rebuild = TablePlan::Rebuild {
        reasons: vec![RebuildReason::ExtraColumn {
            column: "legacy".into(),
        }],
    };
    assert!(describe_plan(&rebuild).starts_with("rebuild: "));
}
