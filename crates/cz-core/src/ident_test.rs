use super::*;

#[test]
fn test_accepts_room_style_names() {
    for name in ["song", "playlist_song_map", "isLocal", "_hidden", "x1"] {
        assert!(validate_identifier(name).is_ok(), "{name} should be valid");
    }
}

#[test]
fn test_rejects_empty() {
    assert!(TableName::try_new("").is_err());
}

#[test]
fn test_rejects_leading_digit() {
    let err = ColumnName::try_new("1col").unwrap_err();
    assert!(matches!(err, CoreError::InvalidIdentifier { .. }));
}

#[test]
fn test_rejects_injection_attempt() {
    let err = TableName::try_new("song; DROP TABLE song").unwrap_err();
    assert!(err.to_string().contains("disallowed character"));
}

#[test]
fn test_rejects_quotes_and_dots() {
    assert!(TableName::try_new("main.song").is_err());
    assert!(ColumnName::try_new("a\"b").is_err());
}

#[test]
fn test_rejects_reserved_prefix_case_insensitively() {
    assert!(TableName::try_new("sqlite_master").is_err());
    assert!(TableName::try_new("SQLITE_sequence").is_err());
    assert!(TableName::try_new("sqlitefoo").is_ok());
}

#[test]
fn test_rejects_overlong() {
    let long = "a".repeat(MAX_IDENT_LEN + 1);
    assert!(IndexName::try_new(long).is_err());
    assert!(IndexName::try_new("a".repeat(MAX_IDENT_LEN)).is_ok());
}

#[test]
fn test_quoted_wraps_in_double_quotes() {
    let name = ColumnName::try_new("timestamp").unwrap();
    assert_eq!(name.quoted(), "\"timestamp\"");
}

#[test]
fn test_compares_with_str() {
    let name = TableName::try_new("song").unwrap();
    assert_eq!(name, "song");
    assert_eq!(name.as_str(), "song");
}

#[test]
fn test_deserialize_validates() {
    let ok: TableName = serde_yaml::from_str("song").unwrap();
    assert_eq!(ok, "song");
    let bad: Result<TableName, _> = serde_yaml::from_str("\"bad name\"");
    assert!(bad.is_err());
}
