//! Database error handling utilities
//!
//! Turns constraint violations raised while committing an imported row into
//! messages that read well in an error report.
//!
//! ```rust,ignore
//! sqlx::query("INSERT INTO facilities ...")
//!     .execute(&self.pool)
//!     .await
//!     .map_err(|e| write_error(e, "Facility", &facility.code))?;
//! ```

use sqlx::Error as SqlxError;

/// Result of checking for a database constraint violation
#[derive(Debug)]
pub enum ConstraintViolation {
    /// A unique constraint was violated
    UniqueViolation,
    /// A foreign key constraint was violated
    ForeignKeyViolation,
    /// No constraint violation - some other error occurred
    Other(SqlxError),
}

/// Check the type of database constraint violation
pub fn check_constraint_violation(error: SqlxError) -> ConstraintViolation {
    if let SqlxError::Database(ref db_err) = error {
        if db_err.is_unique_violation() {
            return ConstraintViolation::UniqueViolation;
        }
        if db_err.is_foreign_key_violation() {
            return ConstraintViolation::ForeignKeyViolation;
        }
    }
    ConstraintViolation::Other(error)
}

/// Error for a failed insert of `entity` identified by `key`
///
/// A unique violation here means another upload committed the same key after
/// the duplicate check ran.
pub fn write_error(error: SqlxError, entity: &str, key: &str) -> anyhow::Error {
    match check_constraint_violation(error) {
        ConstraintViolation::UniqueViolation => {
            anyhow::anyhow!("{} '{}' already exists", entity, key)
        },
        ConstraintViolation::ForeignKeyViolation => {
            anyhow::anyhow!("{} '{}' references a record that no longer exists", entity, key)
        },
        ConstraintViolation::Other(e) => {
            anyhow::Error::new(e).context(format!("Failed to save {} '{}'", entity, key))
        },
    }
}
