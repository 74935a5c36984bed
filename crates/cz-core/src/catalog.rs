//! The set of desired tables for one schema version.

use crate::error::{CoreError, CoreResult};
use crate::schema::TableSchema;
use crate::version::SchemaVersion;
use std::collections::HashSet;

/// Desired tables at a given version, in a fixed processing order.
///
/// The order is the order repair walks tables in; a table must appear after
/// every table its foreign keys reference.
#[derive(Debug, Clone)]
pub struct Catalog {
    version: SchemaVersion,
    tables: Vec<TableSchema>,
}

impl Catalog {
    /// Build a catalog, checking names are unique and parents come first.
    pub fn new(version: SchemaVersion, tables: Vec<TableSchema>) -> CoreResult<Self> {
        let mut seen: HashSet<String> = HashSet::new();
        for table in &tables {
            let key = table.name.to_ascii_lowercase();
            for fk in &table.foreign_keys {
                let parent = fk.parent.to_ascii_lowercase();
                if parent != key && !seen.contains(&parent) {
                    return Err(CoreError::InvalidTable {
                        table: table.name.to_string(),
                        reason: format!(
                            "references '{}' which is not declared before it",
                            fk.parent
                        ),
                    });
                }
            }
            if !seen.insert(key) {
                return Err(CoreError::InvalidTable {
                    table: table.name.to_string(),
                    reason: "declared twice in catalog".into(),
                });
            }
        }
        Ok(Self { version, tables })
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Like [`table`](Self::table), failing with [`CoreError::UnknownTable`].
    pub fn require_table(&self, name: &str) -> CoreResult<&TableSchema> {
        self.table(name).ok_or_else(|| CoreError::UnknownTable {
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, ForeignKeyDef};

    fn table(name: &str, parent: Option<&str>) -> TableSchema {
        let mut builder = TableSchema::builder(name)
            .column(ColumnDef::text("id").not_null())
            .column(ColumnDef::text("parentId"))
            .primary_key(&["id"]);
        if let Some(parent) = parent {
            builder = builder.foreign_key(ForeignKeyDef::new(&["parentId"], parent, &["id"]));
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_preserves_declared_order() {
        let catalog = Catalog::new(
            SchemaVersion::new(3),
            vec![table("a", None), table("b", Some("a"))],
        )
        .unwrap();
        let names: Vec<&str> = catalog.tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(catalog.version(), SchemaVersion::new(3));
    }

    #[test]
    fn test_rejects_child_before_parent() {
        let result = Catalog::new(
            SchemaVersion::new(1),
            vec![table("b", Some("a")), table("a", None)],
        );
        assert!(matches!(result, Err(CoreError::InvalidTable { .. })));
    }

    #[test]
    fn test_allows_self_reference() {
        assert!(Catalog::new(SchemaVersion::new(1), vec![table("a", Some("a"))]).is_ok());
    }

    #[test]
    fn test_rejects_duplicate_tables() {
        let result = Catalog::new(SchemaVersion::new(1), vec![table("a", None), table("A", None)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_lookup_by_name() {
        let catalog = Catalog::new(SchemaVersion::new(1), vec![table("a", None)]).unwrap();
        assert!(catalog.table("A").is_some());
        assert!(matches!(
            catalog.require_table("zzz"),
            Err(CoreError::UnknownTable { .. })
        ));
    }
}
