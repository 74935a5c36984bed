//! SQL quoting utilities
//!
//! Identifiers reaching these helpers have already passed the allow-list in
//! [`crate::ident`]; quoting is still applied so rendered DDL is unambiguous
//! even for names that collide with keywords (`timestamp`, `explicit`, ...).

/// Quote a SQL identifier.
///
/// Wraps the identifier in double quotes and escapes any embedded double quotes
/// by doubling them, following the SQL standard.
///
/// # Examples
/// ```
/// use cz_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("song"), r#""song""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Escape a SQL string literal value by doubling single quotes.
///
/// This is for use inside single-quoted SQL string literals, not identifiers.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render `value` as a single-quoted SQL text literal.
///
/// # Examples
/// ```
/// use cz_core::sql_utils::quote_text;
/// assert_eq!(quote_text("it's"), "'it''s'");
/// ```
pub fn quote_text(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

/// Strip whitespace and any number of parentheses that wrap the whole
/// expression.
///
/// SQLite reports `DEFAULT (0)` back as `(0)`; this reduces it to `0`.
/// Parentheses that do not enclose the entire text are left alone, so
/// `(1) + (2)` is returned unchanged.
pub fn strip_wrapping_parens(expr: &str) -> &str {
    let mut s = expr.trim();
    while s.starts_with('(') && s.ends_with(')') && outer_parens_match(s) {
        s = s[1..s.len() - 1].trim();
    }
    s
}

/// True if the opening paren at index 0 closes at the last byte.
fn outer_parens_match(s: &str) -> bool {
    let mut depth = 0usize;
    let mut in_quote = false;
    let last = s.len() - 1;
    for (i, ch) in s.char_indices() {
        match ch {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != last {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
