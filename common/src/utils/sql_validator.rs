//! SQL statement validator.
//!
//! Named queries are fixed text supplied by configuration; this check keeps
//! anything but reads out of the catalog. Literals, quoted identifiers and
//! comments are ignored, and keywords only match as whole words.

use crate::errors::AppError;
use crate::utils::sql_scanner::code_only;

/// Validates SQL statements for security.
pub struct SqlValidator;

/// Keywords that must not appear in a catalog statement.
const FORBIDDEN_KEYWORDS: [&str; 8] = [
    "DROP", "TRUNCATE", "DELETE", "ALTER", "INSERT", "UPDATE", "GRANT", "CREATE",
];

impl SqlValidator {
    /// Validates that `sql` is a single read-only statement.
    ///
    /// # Errors
    /// Returns `AppError::UnsafeSql` if the statement does not start with
    /// `SELECT`/`WITH`, chains several statements, or contains a forbidden
    /// keyword.
    pub fn validate_read_only(sql: &str) -> Result<(), AppError> {
        let code = code_only(sql);
        if !starts_with_query(&code) {
            return Err(AppError::UnsafeSql("only SELECT statements are allowed".into()));
        }
        if code.trim().trim_end_matches(';').contains(';') {
            return Err(AppError::UnsafeSql("multiple statements are not allowed".into()));
        }

        let forbidden = code
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .find_map(|word| {
                FORBIDDEN_KEYWORDS
                    .into_iter()
                    .find(|keyword| word.eq_ignore_ascii_case(keyword))
            });
        if let Some(keyword) = forbidden {
            return Err(AppError::UnsafeSql(format!("forbidden operation: {}", keyword)));
        }
        Ok(())
    }

    /// Checks if the SQL is a query (`SELECT` or `WITH ... SELECT`).
    pub fn is_select(sql: &str) -> bool {
        starts_with_query(&code_only(sql))
    }
}

fn starts_with_query(code: &str) -> bool {
    let first = code
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .find(|word| !word.is_empty())
        .unwrap_or_default();
    first.eq_ignore_ascii_case("SELECT") || first.eq_ignore_ascii_case("WITH")
}
