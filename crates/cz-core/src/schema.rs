//! Typed table definitions.
//!
//! A [`TableSchema`] is the compile-time shape the repair engine enforces.
//! Definitions are assembled from unvalidated drafts ([`ColumnDef`],
//! [`IndexDef`], [`ForeignKeyDef`]) by [`TableSchema::builder`], which checks
//! every identifier and cross-reference once so that DDL rendering never
//! interpolates unchecked text.

use crate::error::{CoreError, CoreResult};
use crate::ident::{ColumnName, IndexName, TableName};
use crate::literal::DefaultValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Declared column type. Rendered upper-case, matching `PRAGMA table_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    Integer,
    Text,
    Real,
    Blob,
}

impl SqlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Text => "TEXT",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }

    /// Parse a declared type as reported by the engine (case-insensitive).
    pub fn parse(declared: &str) -> Option<Self> {
        match declared.trim().to_ascii_uppercase().as_str() {
            "INTEGER" => Some(SqlType::Integer),
            "TEXT" => Some(SqlType::Text),
            "REAL" => Some(SqlType::Real),
            "BLOB" => Some(SqlType::Blob),
            _ => None,
        }
    }

    /// Literal used for a required column that has neither a default nor an
    /// explicit fallback.
    pub fn zero_literal(&self) -> &'static str {
        match self {
            SqlType::Integer | SqlType::Real => "0",
            SqlType::Text => "''",
            SqlType::Blob => "X''",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired definition of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: ColumnName,
    pub sql_type: SqlType,
    pub not_null: bool,
    pub default: Option<DefaultValue>,
    /// Substitution used by a rebuild when the column is absent and has no
    /// default (e.g. `-1` for an unknown duration).
    pub fallback: Option<DefaultValue>,
}

impl ColumnSpec {
    /// Column definition as it appears inside `CREATE TABLE` / `ADD COLUMN`.
    pub fn definition_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name.quoted(), self.sql_type);
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.render());
        }
        sql
    }

    /// Literal that stands in for this column when the source row has no
    /// value for it: the default, then the fallback, then a type-appropriate
    /// zero for required columns, `NULL` otherwise.
    pub fn substitute_literal(&self) -> String {
        if let Some(default) = &self.default {
            return default.render();
        }
        if let Some(fallback) = &self.fallback {
            return fallback.render();
        }
        if self.not_null {
            self.sql_type.zero_literal().to_string()
        } else {
            "NULL".to_string()
        }
    }
}

/// Unvalidated column draft consumed by [`TableSchemaBuilder::column`].
#[derive(Debug, Clone)]
pub struct ColumnDef {
    name: String,
    sql_type: SqlType,
    not_null: bool,
    default: Option<DefaultValue>,
    fallback: Option<DefaultValue>,
}

impl ColumnDef {
    pub fn new(name: &str, sql_type: SqlType) -> Self {
        Self {
            name: name.to_string(),
            sql_type,
            not_null: false,
            default: None,
            fallback: None,
        }
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, SqlType::Integer)
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, SqlType::Text)
    }

    pub fn real(name: &str) -> Self {
        Self::new(name, SqlType::Real)
    }

    pub fn blob(name: &str) -> Self {
        Self::new(name, SqlType::Blob)
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn default_int(self, value: i64) -> Self {
        self.default(DefaultValue::Integer(value))
    }

    pub fn fallback(mut self, value: DefaultValue) -> Self {
        self.fallback = Some(value);
        self
    }

    /// Validate the draft into a [`ColumnSpec`].
    pub fn into_spec(self) -> CoreResult<ColumnSpec> {
        Ok(ColumnSpec {
            name: ColumnName::try_new(self.name)?,
            sql_type: self.sql_type,
            not_null: self.not_null,
            default: self.default,
            fallback: self.fallback,
        })
    }
}

/// Referential action for a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FkAction {
    #[default]
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

impl FkAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            FkAction::NoAction => "NO ACTION",
            FkAction::Restrict => "RESTRICT",
            FkAction::SetNull => "SET NULL",
            FkAction::SetDefault => "SET DEFAULT",
            FkAction::Cascade => "CASCADE",
        }
    }
}

/// Validated foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeySpec {
    pub columns: Vec<ColumnName>,
    pub parent: TableName,
    pub parent_columns: Vec<ColumnName>,
    pub on_update: FkAction,
    pub on_delete: FkAction,
}

impl ForeignKeySpec {
    fn clause_sql(&self) -> String {
        format!(
            "FOREIGN KEY({}) REFERENCES {}({}) ON UPDATE {} ON DELETE {}",
            join_quoted(&self.columns),
            self.parent.quoted(),
            join_quoted(&self.parent_columns),
            self.on_update.as_sql(),
            self.on_delete.as_sql(),
        )
    }
}

/// Unvalidated foreign-key draft.
#[derive(Debug, Clone)]
pub struct ForeignKeyDef {
    columns: Vec<String>,
    parent: String,
    parent_columns: Vec<String>,
    on_update: FkAction,
    on_delete: FkAction,
}

impl ForeignKeyDef {
    pub fn new(columns: &[&str], parent: &str, parent_columns: &[&str]) -> Self {
        Self {
            columns: to_strings(columns),
            parent: parent.to_string(),
            parent_columns: to_strings(parent_columns),
            on_update: FkAction::NoAction,
            on_delete: FkAction::NoAction,
        }
    }

    pub fn on_update(mut self, action: FkAction) -> Self {
        self.on_update = action;
        self
    }

    pub fn on_delete(mut self, action: FkAction) -> Self {
        self.on_delete = action;
        self
    }
}

/// Validated index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: IndexName,
    pub columns: Vec<ColumnName>,
    pub unique: bool,
}

impl IndexSpec {
    /// `CREATE [UNIQUE] INDEX IF NOT EXISTS` for `table`.
    pub fn create_sql(&self, table: &TableName) -> String {
        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            self.name.quoted(),
            table.quoted(),
            join_quoted(&self.columns),
        )
    }
}

/// Unvalidated index draft. Unnamed indexes are called
/// `index_<table>_<col>[_<col>...]`.
#[derive(Debug, Clone)]
pub struct IndexDef {
    name: Option<String>,
    columns: Vec<String>,
    unique: bool,
}

impl IndexDef {
    pub fn on(columns: &[&str]) -> Self {
        Self {
            name: None,
            columns: to_strings(columns),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Desired shape of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: TableName,
    pub columns: Vec<ColumnSpec>,
    pub primary_key: Vec<ColumnName>,
    pub foreign_keys: Vec<ForeignKeySpec>,
    pub indexes: Vec<IndexSpec>,
}

impl TableSchema {
    /// Start building a table definition.
    pub fn builder(name: &str) -> TableSchemaBuilder {
        TableSchemaBuilder {
            name: name.to_string(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Look up a column by name (SQLite identifiers are case-insensitive).
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Like [`column`](Self::column), failing with [`CoreError::UnknownColumn`].
    pub fn require_column(&self, name: &str) -> CoreResult<&ColumnSpec> {
        self.column(name).ok_or_else(|| CoreError::UnknownColumn {
            table: self.name.to_string(),
            column: name.to_string(),
        })
    }

    /// `CREATE TABLE` statement with columns in declared order.
    pub fn create_table_sql(&self) -> String {
        self.render_create("CREATE TABLE")
    }

    /// `CREATE TABLE IF NOT EXISTS` variant used on the creation path.
    pub fn create_table_if_not_exists_sql(&self) -> String {
        self.render_create("CREATE TABLE IF NOT EXISTS")
    }

    /// One `CREATE INDEX IF NOT EXISTS` per declared index.
    pub fn create_index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|idx| idx.create_sql(&self.name))
            .collect()
    }

    fn render_create(&self, verb: &str) -> String {
        let mut parts: Vec<String> = self.columns.iter().map(|c| c.definition_sql()).collect();
        parts.push(format!("PRIMARY KEY({})", join_quoted(&self.primary_key)));
        parts.extend(self.foreign_keys.iter().map(|fk| fk.clause_sql()));
        format!("{verb} {} ({})", self.name.quoted(), parts.join(", "))
    }
}

/// Builder returned by [`TableSchema::builder`].
#[derive(Debug, Clone)]
pub struct TableSchemaBuilder {
    name: String,
    columns: Vec<ColumnDef>,
    primary_key: Vec<String>,
    foreign_keys: Vec<ForeignKeyDef>,
    indexes: Vec<IndexDef>,
}

impl TableSchemaBuilder {
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = to_strings(columns);
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKeyDef) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    /// Validate identifiers and cross-references.
    pub fn build(self) -> CoreResult<TableSchema> {
        let name = TableName::try_new(self.name)?;
        let invalid = |reason: String| CoreError::InvalidTable {
            table: name.to_string(),
            reason,
        };

        if self.columns.is_empty() {
            return Err(invalid("no columns declared".into()));
        }

        let columns = self
            .columns
            .into_iter()
            .map(ColumnDef::into_spec)
            .collect::<CoreResult<Vec<_>>>()?;

        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.to_ascii_lowercase()) {
                return Err(invalid(format!("duplicate column '{}'", col.name)));
            }
        }

        let lookup = |col: &str, what: &str| -> CoreResult<ColumnName> {
            if seen.contains(&col.to_ascii_lowercase()) {
                ColumnName::try_new(col)
            } else {
                Err(invalid(format!("{what} references unknown column '{col}'")))
            }
        };

        if self.primary_key.is_empty() {
            return Err(invalid("primary key must name at least one column".into()));
        }
        let primary_key = self
            .primary_key
            .iter()
            .map(|c| lookup(c, "primary key"))
            .collect::<CoreResult<Vec<_>>>()?;

        let mut foreign_keys = Vec::with_capacity(self.foreign_keys.len());
        for fk in self.foreign_keys {
            if fk.columns.is_empty() || fk.columns.len() != fk.parent_columns.len() {
                return Err(invalid(format!(
                    "foreign key to '{}' has mismatched column lists",
                    fk.parent
                )));
            }
            foreign_keys.push(ForeignKeySpec {
                columns: fk
                    .columns
                    .iter()
                    .map(|c| lookup(c, "foreign key"))
                    .collect::<CoreResult<Vec<_>>>()?,
                parent: TableName::try_new(fk.parent)?,
                parent_columns: fk
                    .parent_columns
                    .into_iter()
                    .map(ColumnName::try_new)
                    .collect::<CoreResult<Vec<_>>>()?,
                on_update: fk.on_update,
                on_delete: fk.on_delete,
            });
        }

        let mut indexes = Vec::with_capacity(self.indexes.len());
        for idx in self.indexes {
            if idx.columns.is_empty() {
                return Err(invalid("index must name at least one column".into()));
            }
            let index_name = idx
                .name
                .unwrap_or_else(|| format!("index_{}_{}", name, idx.columns.join("_")));
            indexes.push(IndexSpec {
                name: IndexName::try_new(index_name)?,
                columns: idx
                    .columns
                    .iter()
                    .map(|c| lookup(c, "index"))
                    .collect::<CoreResult<Vec<_>>>()?,
                unique: idx.unique,
            });
        }

        Ok(TableSchema {
            name,
            columns,
            primary_key,
            foreign_keys,
            indexes,
        })
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn join_quoted(names: &[ColumnName]) -> String {
    names
        .iter()
        .map(|n| n.quoted())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
