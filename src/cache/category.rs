//! Category names.
//!
//! Categories tag stored points, filter queries and name the per-category
//! views materialized on close. Only identifier-safe ASCII is accepted so a
//! category can be placed in a view definition verbatim.

use crate::error::{GeohError, Result};
use std::fmt;

/// Longest accepted category name.
pub const MAX_CATEGORY_LEN: usize = 64;

/// A validated category name: `[A-Za-z_][A-Za-z0-9_]*`, at most 64 characters.
///
/// Names are case-insensitive, like the SQLite identifiers they end up in,
/// and are kept in lowercase: `Cafe` and `cafe` are the same category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(String);

impl Category {
    /// Parses and validates a category name.
    ///
    /// # Examples
    ///
    /// ```
    /// use geoh::cache::Category;
    ///
    /// assert!(Category::parse("fuel_stations").is_ok());
    /// assert!(Category::parse("x'); DROP TABLE points; --").is_err());
    /// ```
    pub fn parse<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();

        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return Err(GeohError::InvalidCategory(
                "category name cannot be empty".into(),
            ));
        };

        if name.len() > MAX_CATEGORY_LEN {
            return Err(GeohError::InvalidCategory(format!(
                "category name cannot exceed {} characters",
                MAX_CATEGORY_LEN
            )));
        }

        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(GeohError::InvalidCategory(format!(
                "category '{}' must start with an ASCII letter or underscore",
                name
            )));
        }

        if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(GeohError::InvalidCategory(format!(
                "category '{}' contains unsupported character {:?}",
                name, bad
            )));
        }

        Ok(Self(name.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the view listing this category's points.
    pub fn view_name(&self) -> String {
        format!("view_{}", self.0)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_identifiers() {
        for name in ["cafe", "_private", "fuel2", "a", "snake_case_name"] {
            assert_eq!(Category::parse(name).unwrap().as_str(), name);
        }
        assert_eq!(Category::parse("cafe").unwrap().view_name(), "view_cafe");
    }

    #[test]
    fn test_names_ignore_case() {
        let upper = Category::parse("Cafe").unwrap();
        let lower = Category::parse("cafe").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), "cafe");
        assert_eq!(Category::parse("FUEL_2").unwrap().view_name(), "view_fuel_2");
    }

    #[test]
    fn test_rejects_unsafe_names() {
        for name in [
            "",
            "2fast",
            "with space",
            "quote'",
            "dq\"",
            "semi;colon",
            "dash-ed",
            "café",
            "x'); DROP TABLE points; --",
        ] {
            assert!(
                matches!(Category::parse(name), Err(GeohError::InvalidCategory(_))),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_length_limit() {
        assert!(Category::parse("a".repeat(MAX_CATEGORY_LEN)).is_ok());
        assert!(Category::parse("a".repeat(MAX_CATEGORY_LEN + 1)).is_err());
    }
}
