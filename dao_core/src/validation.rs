//! Identifier validation
//!
//! Every table and column name that reaches generated SQL passes through one
//! of the validated name types below, then is emitted double-quoted.

use std::fmt;

/// Validation errors for database identifiers
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Name contains invalid characters (only alphanumeric and underscore allowed)
    InvalidCharacters(String),
    /// Name is too long (PostgreSQL limit is 63 characters)
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },
    Empty,
    /// Name starts with invalid character (must start with letter or underscore)
    InvalidStartCharacter(String),
    /// Name is a reserved SQL keyword
    ReservedKeyword(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidCharacters(name) => {
                write!(f, "Invalid characters in name '{}': only alphanumeric characters and underscores are allowed", name)
            }
            ValidationError::TooLong {
                name,
                length,
                max_length,
            } => {
                write!(
                    f,
                    "Name '{}' is too long: {} characters (max {})",
                    name, length, max_length
                )
            }
            ValidationError::Empty => {
                write!(f, "Name cannot be empty")
            }
            ValidationError::InvalidStartCharacter(name) => {
                write!(f, "Name '{}' must start with a letter or underscore", name)
            }
            ValidationError::ReservedKeyword(name) => {
                write!(f, "Name '{}' is a reserved SQL keyword", name)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// PostgreSQL identifier length limit
const MAX_IDENTIFIER_LENGTH: usize = 63;

fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            name: name.to_string(),
            length: name.len(),
            max_length: MAX_IDENTIFIER_LENGTH,
        });
    }

    let first_char = name.chars().next().ok_or(ValidationError::Empty)?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(ValidationError::InvalidStartCharacter(name.to_string()));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidCharacters(name.to_string()));
    }

    Ok(())
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name)
}

/// A validated table name that is safe to use in SQL queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedTableName(String);

impl ValidatedTableName {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        validate_identifier(name)?;
        if Self::is_reserved_keyword(name) {
            return Err(ValidationError::ReservedKeyword(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The double-quoted form used in generated SQL
    pub fn quoted(&self) -> String {
        quote(&self.0)
    }

    fn is_reserved_keyword(name: &str) -> bool {
        const RESERVED_KEYWORDS: &[&str] = &[
            "ALL", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "CHECK",
            "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "DEFAULT", "DELETE", "DESC", "DISTINCT",
            "DROP", "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FOR", "FOREIGN",
            "FROM", "FULL", "GRANT", "GROUP", "HAVING", "IN", "INNER", "INSERT", "INTERSECT",
            "INTO", "IS", "JOIN", "LEFT", "LIKE", "LIMIT", "NOT", "NULL", "OFFSET", "ON",
            "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES", "RETURNING", "RIGHT", "SELECT",
            "TABLE", "THEN", "TO", "TRUE", "UNION", "UNIQUE", "UPDATE", "USER", "USING",
            "WHEN", "WHERE", "WITH",
        ];

        RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str())
    }
}

impl fmt::Display for ValidatedTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated column reference: `column` or `relation.column`
///
/// Column names are always quoted when rendered, so keywords are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedFieldName {
    qualifier: Option<String>,
    column: String,
}

impl ValidatedFieldName {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        match name.rsplit_once('.') {
            Some((qualifier, column)) => {
                validate_identifier(qualifier)?;
                validate_identifier(column)?;
                Ok(Self {
                    qualifier: Some(qualifier.to_string()),
                    column: column.to_string(),
                })
            }
            None => {
                validate_identifier(name)?;
                Ok(Self {
                    qualifier: None,
                    column: name.to_string(),
                })
            }
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Render as `"qualifier"."column"`, qualifying bare columns with `default_table`
    pub fn qualified(&self, default_table: &str) -> String {
        let table = self.qualifier.as_deref().unwrap_or(default_table);
        format!("{}.{}", quote(table), quote(&self.column))
    }

    /// Render as a bare `"column"` (SET lists, INSERT column lists)
    pub fn quoted(&self) -> String {
        quote(&self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_table_names() {
        assert!(ValidatedTableName::new("users").is_ok());
        assert!(ValidatedTableName::new("user_profiles").is_ok());
        assert!(ValidatedTableName::new("_private").is_ok());
        assert_eq!(ValidatedTableName::new("orders").unwrap().quoted(), "\"orders\"");
    }

    #[test]
    fn test_table_name_rejections() {
        assert_eq!(ValidatedTableName::new(""), Err(ValidationError::Empty));
        assert!(matches!(
            ValidatedTableName::new("select"),
            Err(ValidationError::ReservedKeyword(_))
        ));
        assert!(matches!(
            ValidatedTableName::new("1users"),
            Err(ValidationError::InvalidStartCharacter(_))
        ));
        assert!(matches!(
            ValidatedTableName::new(&"t".repeat(64)),
            Err(ValidationError::TooLong { length: 64, .. })
        ));
    }

    #[test]
    fn test_field_names_qualified() {
        let field = ValidatedFieldName::new(" name ").unwrap();
        assert_eq!(field.qualified("users"), "\"users\".\"name\"");
        assert_eq!(field.quoted(), "\"name\"");

        let field = ValidatedFieldName::new("profile.nickname").unwrap();
        assert_eq!(field.qualifier(), Some("profile"));
        assert_eq!(field.qualified("users"), "\"profile\".\"nickname\"");
    }

    #[test]
    fn test_keywords_allowed_as_quoted_columns() {
        let field = ValidatedFieldName::new("order").unwrap();
        assert_eq!(field.qualified("items"), "\"items\".\"order\"");
    }

    #[test]
    fn test_sql_injection_prevention() {
        let malicious_names = [
            "name; DROP TABLE users; --",
            "name' OR '1'='1",
            "name/**/UNION/**/SELECT",
            "name\"; DELETE FROM users; --",
            "a.b.c",
            "id DESC, (SELECT 1)",
        ];

        for name in malicious_names {
            assert!(
                ValidatedFieldName::new(name).is_err(),
                "Should reject malicious name: {}",
                name
            );
        }
    }
}
