//! Validated SQL identifiers.
//!
//! Table, column, and index names are interpolated into DDL, so every newtype
//! here only admits names matching `[A-Za-z_][A-Za-z0-9_]*` of at most
//! [`MAX_IDENT_LEN`] characters, and rejects the engine-reserved `sqlite_`
//! prefix. All share the same set of trait impls (Display, Deref, AsRef,
//! Borrow, TryFrom, PartialEq, Serialize, Deserialize), generated by
//! `define_identifier!`.

use crate::error::{CoreError, CoreResult};
use crate::sql_utils::quote_ident;

/// Longest identifier accepted by [`validate_identifier`].
pub const MAX_IDENT_LEN: usize = 64;

/// Check `name` against the identifier allow-list.
///
/// Returns the reason for rejection on failure.
pub fn validate_identifier(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err("must not be empty".to_string());
    };
    if name.len() > MAX_IDENT_LEN {
        return Err(format!("longer than {MAX_IDENT_LEN} characters"));
    }
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err("must start with a letter or underscore".to_string());
    }
    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(format!("contains disallowed character {bad:?}"));
    }
    if name
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("sqlite_"))
    {
        return Err("the sqlite_ prefix is reserved by the engine".to_string());
    }
    Ok(())
}

/// Define an allow-listed identifier newtype.
macro_rules! define_identifier {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $Name::try_new(s).map_err(serde::de::Error::custom)
            }
        }

        impl $Name {
            /// Validate and wrap `name`.
            pub fn try_new(name: impl Into<String>) -> CoreResult<Self> {
                let s = name.into();
                match validate_identifier(&s) {
                    Ok(()) => Ok(Self(s)),
                    Err(reason) => Err(CoreError::InvalidIdentifier { name: s, reason }),
                }
            }

            /// Return the underlying name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }

            /// The name as a double-quoted SQL identifier.
            pub fn quoted(&self) -> String {
                quote_ident(&self.0)
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str { &self.0 }
        }

        impl std::ops::Deref for $Name {
            type Target = str;
            fn deref(&self) -> &str { &self.0 }
        }

        impl std::borrow::Borrow<str> for $Name {
            fn borrow(&self) -> &str { &self.0 }
        }

        impl TryFrom<String> for $Name {
            type Error = CoreError;
            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::try_new(s)
            }
        }

        impl TryFrom<&str> for $Name {
            type Error = CoreError;
            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::try_new(s)
            }
        }

        impl PartialEq<str> for $Name {
            fn eq(&self, other: &str) -> bool { self.0 == other }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool { self.0 == *other }
        }

        impl PartialEq<String> for $Name {
            fn eq(&self, other: &String) -> bool { self.0 == *other }
        }
    };
}

define_identifier! {
    /// Name of a table.
    pub struct TableName;
}

define_identifier! {
    /// Name of a column within a table.
    pub struct ColumnName;
}

define_identifier! {
    /// Name of an index.
    pub struct IndexName;
}

#[cfg(test)]
#[path = "ident_test.rs"]
mod tests;
