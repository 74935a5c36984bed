//! Default-value literals as the engine stores them.
//!
//! SQLite keeps the `DEFAULT` clause text verbatim and `PRAGMA table_info`
//! reports it back unchanged, so `DEFAULT 0` and `DEFAULT '0'` are different
//! schemas even though both read back as zero. Every default the storage
//! layer writes goes through [`DefaultValue::render`], and drift detection
//! compares live text with [`DefaultValue::accepts`].

use crate::sql_utils::{quote_text, strip_wrapping_parens};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A column default the schema builder knows how to render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// Integer literal, rendered unquoted (`0`, `-1`).
    Integer(i64),
    /// Text literal, rendered single-quoted with `''` escaping.
    Text(String),
    /// The `CURRENT_TIMESTAMP` keyword. Cannot be added with `ALTER TABLE`.
    CurrentTimestamp,
}

impl DefaultValue {
    /// The exact text SQLite will store for this default.
    pub fn render(&self) -> String {
        match self {
            DefaultValue::Integer(v) => v.to_string(),
            DefaultValue::Text(s) => quote_text(s),
            DefaultValue::CurrentTimestamp => "CURRENT_TIMESTAMP".to_string(),
        }
    }

    /// Whether a live `dflt_value` is an accepted textual form of this default.
    ///
    /// Accepted: the canonical rendering, optionally wrapped in parentheses.
    /// A missing or `NULL` live default never matches.
    pub fn accepts(&self, live: Option<&str>) -> bool {
        let Some(live) = live.map(strip_wrapping_parens) else {
            return false;
        };
        if is_null_literal(live) {
            return false;
        }
        match self {
            DefaultValue::CurrentTimestamp => live.eq_ignore_ascii_case("CURRENT_TIMESTAMP"),
            _ => live == self.render(),
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// True for a live default that means "no default" (`None`-equivalent text).
pub fn is_null_literal(live: &str) -> bool {
    strip_wrapping_parens(live).eq_ignore_ascii_case("NULL")
}
