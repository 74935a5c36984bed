//! Live schema metadata read through `PRAGMA table_info` / `index_list`.

use cz_core::sql_utils::{quote_ident, quote_text};
use cz_db::{Database, DbResult, Row, Value};
use serde::Serialize;

/// One column as the engine reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveColumnInfo {
    pub cid: i64,
    pub name: String,
    /// Declared type text, verbatim (may be empty).
    pub sql_type: String,
    pub not_null: bool,
    /// `dflt_value` text, `None` when the column has no default.
    pub default_literal: Option<String>,
    /// 1-based position in the primary key, 0 when not part of it.
    pub pk_position: u32,
}

impl LiveColumnInfo {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            cid: row.i64_at(0)?,
            name: row.str_at(1)?.to_string(),
            sql_type: row.opt_str_at(2)?.unwrap_or_default().to_string(),
            not_null: row.i64_at(3)? != 0,
            // table_info reports defaults as their SQL text.
            default_literal: match row.get(4) {
                Some(Value::Text(s)) => Some(s.clone()),
                _ => None,
            },
            pk_position: u32::try_from(row.i64_at(5)?).unwrap_or(0),
        })
    }
}

/// An index attached to a live table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveIndexInfo {
    pub name: String,
    pub unique: bool,
    /// Declared with `CREATE INDEX` rather than implied by a constraint.
    pub explicit: bool,
}

/// Side-effect-free reader of table metadata.
pub struct SchemaIntrospector<'a> {
    db: &'a dyn Database,
}

impl<'a> SchemaIntrospector<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Columns of `table` in declared order; empty if the table does not exist.
    pub fn describe(&self, table: &str) -> DbResult<Vec<LiveColumnInfo>> {
        self.db
            .query(&format!("PRAGMA table_info({})", quote_ident(table)))?
            .iter()
            .map(LiveColumnInfo::from_row)
            .collect()
    }

    pub fn table_exists(&self, table: &str) -> DbResult<bool> {
        let rows = self.db.query(&format!(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = {}",
            quote_text(table)
        ))?;
        Ok(!rows.is_empty())
    }

    /// Indexes attached to `table`; empty if the table does not exist.
    pub fn indexes(&self, table: &str) -> DbResult<Vec<LiveIndexInfo>> {
        self.db
            .query(&format!("PRAGMA index_list({})", quote_ident(table)))?
            .iter()
            .map(|row| {
                Ok(LiveIndexInfo {
                    name: row.str_at(1)?.to_string(),
                    unique: row.i64_at(2)? != 0,
                    explicit: row.str_at(3)? == "c",
                })
            })
            .collect()
    }

    /// Live primary-key columns in key order.
    pub fn primary_key(columns: &[LiveColumnInfo]) -> Vec<&str> {
        let mut pk: Vec<&LiveColumnInfo> = columns.iter().filter(|c| c.pk_position > 0).collect();
        pk.sort_by_key(|c| c.pk_position);
        pk.into_iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
#[path = "introspect_test.rs"]
mod tests;
