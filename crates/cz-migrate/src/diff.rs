//! Drift classification: what it takes to bring a live table to its desired
//! definition.

use crate::introspect::{LiveColumnInfo, SchemaIntrospector};
use cz_core::literal::is_null_literal;
use cz_core::{SqlType, TableSchema};
use serde::Serialize;
use std::fmt;

/// Action needed for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TablePlan {
    /// Table absent; ordinary schema creation handles it.
    Missing,
    InSync,
    /// Only missing columns that `ADD COLUMN` can express.
    Patch { columns: Vec<String> },
    Rebuild { reasons: Vec<RebuildReason> },
}

impl TablePlan {
    pub fn is_in_sync(&self) -> bool {
        matches!(self, TablePlan::InSync)
    }

    /// Short label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            TablePlan::Missing => "missing",
            TablePlan::InSync => "in sync",
            TablePlan::Patch { .. } => "patch",
            TablePlan::Rebuild { .. } => "rebuild",
        }
    }
}

/// Why a table cannot be fixed by adding columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RebuildReason {
    DefaultMismatch {
        column: String,
        expected: Option<String>,
        found: Option<String>,
    },
    NullabilityMismatch {
        column: String,
        expected_not_null: bool,
    },
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },
    PrimaryKeyMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    ExtraColumn {
        column: String,
    },
    /// Required, no default: `ADD COLUMN` cannot express it.
    RequiredColumnMissing {
        column: String,
    },
    MultipleRequiredColumnsMissing {
        columns: Vec<String>,
    },
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_none(v: &Option<String>) -> &str {
            v.as_deref().unwrap_or("none")
        }
        match self {
            RebuildReason::DefaultMismatch {
                column,
                expected,
                found,
            } => write!(
                f,
                "default of {column} is {}, expected {}",
                or_none(found),
                or_none(expected)
            ),
            RebuildReason::NullabilityMismatch {
                column,
                expected_not_null,
            } => {
                if *expected_not_null {
                    write!(f, "{column} should be NOT NULL")
                } else {
                    write!(f, "{column} should be nullable")
                }
            }
            RebuildReason::TypeMismatch {
                column,
                expected,
                found,
            } => write!(f, "{column} has type '{found}', expected {expected}"),
            RebuildReason::PrimaryKeyMismatch { expected, found } => write!(
                f,
                "primary key is ({}), expected ({})",
                found.join(", "),
                expected.join(", ")
            ),
            RebuildReason::ExtraColumn { column } => write!(f, "unexpected column {column}"),
            RebuildReason::RequiredColumnMissing { column } => {
                write!(f, "required column {column} is missing and has no default")
            }
            RebuildReason::MultipleRequiredColumnsMissing { columns } => {
                write!(f, "required columns missing: {}", columns.join(", "))
            }
        }
    }
}

/// Compare `live` (from [`SchemaIntrospector::describe`]) against `desired`.
pub fn classify(desired: &TableSchema, live: &[LiveColumnInfo]) -> TablePlan {
    if live.is_empty() {
        return TablePlan::Missing;
    }

    let mut reasons = Vec::new();
    let mut missing = Vec::new();

    for spec in &desired.columns {
        let Some(col) = live.iter().find(|c| c.name.eq_ignore_ascii_case(&spec.name)) else {
            missing.push(spec);
            continue;
        };

        if SqlType::parse(&col.sql_type) != Some(spec.sql_type) {
            reasons.push(RebuildReason::TypeMismatch {
                column: spec.name.to_string(),
                expected: spec.sql_type.to_string(),
                found: col.sql_type.clone(),
            });
        }
        if col.not_null != spec.not_null {
            reasons.push(RebuildReason::NullabilityMismatch {
                column: spec.name.to_string(),
                expected_not_null: spec.not_null,
            });
        }
        let default_ok = match &spec.default {
            Some(default) => default.accepts(col.default_literal.as_deref()),
            None => col
                .default_literal
                .as_deref()
                .map_or(true, is_null_literal),
        };
        if !default_ok {
            reasons.push(RebuildReason::DefaultMismatch {
                column: spec.name.to_string(),
                expected: spec.default.as_ref().map(|d| d.render()),
                found: col.default_literal.clone(),
            });
        }
    }

    for col in live {
        if desired.column(&col.name).is_none() {
            reasons.push(RebuildReason::ExtraColumn {
                column: col.name.clone(),
            });
        }
    }

    let live_pk = SchemaIntrospector::primary_key(live);
    let pk_matches = live_pk.len() == desired.primary_key.len()
        && live_pk
            .iter()
            .zip(&desired.primary_key)
            .all(|(l, d)| l.eq_ignore_ascii_case(d));
    if !pk_matches {
        reasons.push(RebuildReason::PrimaryKeyMismatch {
            expected: desired.primary_key.iter().map(|c| c.to_string()).collect(),
            found: live_pk.iter().map(|c| c.to_string()).collect(),
        });
    }

    let required: Vec<_> = missing.iter().filter(|c| c.not_null).collect();
    for spec in &required {
        if spec.default.is_none() {
            reasons.push(RebuildReason::RequiredColumnMissing {
                column: spec.name.to_string(),
            });
        }
    }
    if required.len() > 1 {
        reasons.push(RebuildReason::MultipleRequiredColumnsMissing {
            columns: required.iter().map(|c| c.name.to_string()).collect(),
        });
    }

    if !reasons.is_empty() {
        TablePlan::Rebuild { reasons }
    } else if !missing.is_empty() {
        TablePlan::Patch {
            columns: missing.iter().map(|c| c.name.to_string()).collect(),
        }
    } else {
        TablePlan::InSync
    }
}

#[cfg(test)]
#[path = "diff_test.rs"]
mod tests;
