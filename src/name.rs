//! Name validation
//!
//! Database names become directory names and table names become file
//! names, so both are checked before any path is built from them.

use crate::error::{DbError, Result};

/// Longest accepted database or table name
pub const MAX_NAME_LEN: usize = 255;

/// Check a database name.
///
/// Rules are applied in order and the first failure is reported:
/// 1. not empty or whitespace-only
/// 2. does not start with a digit
/// 3. only ASCII letters, digits and underscores
/// 4. no leading or trailing space
/// 5. at most 255 characters
pub fn validate_database_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid("database name cannot be empty"));
    }

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid("database name cannot start with a number"));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(
            "database name can only contain letters, numbers and underscores",
        ));
    }

    // Already excluded by the charset rule
    if name.starts_with(' ') || name.ends_with(' ') {
        return Err(invalid("database name cannot start or end with a space"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(invalid("database name is too long"));
    }

    Ok(())
}

/// Boolean form of [`validate_database_name`]
pub fn is_valid_database_name(name: &str) -> bool {
    validate_database_name(name).is_ok()
}

/// Check a table name.
///
/// Table names are free-form file names (`students.json` is fine) but must
/// stay inside their database directory.
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid("table name cannot be empty"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(invalid("table name is too long"));
    }

    if name == "." || name == ".." {
        return Err(invalid("table name cannot be \".\" or \"..\""));
    }

    if name.contains(['/', '\\', '\0']) {
        return Err(invalid("table name cannot contain path separators"));
    }

    Ok(())
}

fn invalid(reason: &str) -> DbError {
    DbError::Validation(reason.to_string())
}
