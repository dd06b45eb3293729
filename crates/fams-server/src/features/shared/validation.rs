//! Shared row validation utilities
//!
//! Entity pipelines validate spreadsheet rows with a [`RowValidator`], which
//! collects one [`FieldError`] per problem instead of stopping at the first.
//!
//! ```rust,ignore
//! let mut validator = RowValidator::new(row_number);
//! validator.require_columns(&SCHEMA, row);
//! if let Some(code) = present(&row.code) {
//!     validator.check("code", code, validate_code(code, 32));
//! }
//! validator.finish()
//! ```

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

use crate::import::schema::ColumnSchema;
use crate::import::types::{snapshot_of, FieldError};

/// Date format accepted in uploads
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Problems with a single cell value. Rendered after the field name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldValidationError {
    #[error("must not exceed {max_length} characters")]
    TooLong { max_length: usize },

    #[error("can only contain letters, numbers, hyphens, underscores and dots")]
    InvalidCode,

    #[error("must be a valid email address")]
    InvalidEmail,

    #[error("must start with http:// or https://")]
    InvalidUrl,

    #[error("must be a two-letter country code")]
    InvalidCountryCode,

    #[error("must be a date in YYYY-MM-DD format")]
    InvalidDate,

    #[error("must be a non-negative amount with at most 2 decimals")]
    InvalidAmount,

    #[error("must be a whole number between {min} and {max}")]
    OutOfRange { min: i64, max: i64 },
}

/// Collects field errors for one row
#[derive(Debug)]
pub struct RowValidator {
    row_number: usize,
    errors: Vec<FieldError>,
}

impl RowValidator {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            errors: Vec::new(),
        }
    }

    /// Flag every required column of `schema` that is blank in `row`
    pub fn require_columns<R: Serialize>(&mut self, schema: &ColumnSchema, row: &R) {
        let missing = schema.missing_required(&snapshot_of(row), self.row_number);
        self.errors.extend(missing);
    }

    /// Record `result` against `field`, keeping the rejected value
    pub fn check<E: Display>(&mut self, field: &str, value: &str, result: Result<(), E>) {
        if let Err(e) = result {
            self.errors.push(
                FieldError::validation(self.row_number, field, format!("{} {}", field, e))
                    .with_rejected_value(value),
            );
        }
    }

    pub fn finish(self) -> Vec<FieldError> {
        self.errors
    }
}

/// Trimmed cell value, `None` when absent or blank
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Free text with a length limit (in characters)
pub fn validate_text(value: &str, max_length: usize) -> Result<(), FieldValidationError> {
    if value.chars().count() > max_length {
        return Err(FieldValidationError::TooLong { max_length });
    }
    Ok(())
}

/// Business identifier: letters, digits, `-`, `_` and `.`
pub fn validate_code(value: &str, max_length: usize) -> Result<(), FieldValidationError> {
    validate_text(value, max_length)?;

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(FieldValidationError::InvalidCode);
    }

    Ok(())
}

/// Basic URL check (scheme only)
pub fn validate_url(value: &str) -> Result<(), FieldValidationError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(FieldValidationError::InvalidUrl)
    }
}

/// ISO 3166-1 alpha-2 shape (two ASCII letters)
pub fn validate_country_code(value: &str) -> Result<(), FieldValidationError> {
    if value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(FieldValidationError::InvalidCountryCode)
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, FieldValidationError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| FieldValidationError::InvalidDate)
}

pub fn parse_bounded_int(value: &str, min: i64, max: i64) -> Result<i64, FieldValidationError> {
    value
        .parse::<i64>()
        .ok()
        .filter(|n| (min..=max).contains(n))
        .ok_or(FieldValidationError::OutOfRange { min, max })
}

/// Pattern-based formats, compiled once per pipeline
#[derive(Debug, Clone)]
pub struct FormatRules {
    email: Regex,
    amount: Regex,
}

impl FormatRules {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            email: Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$")?,
            // NUMERIC(14,2)
            amount: Regex::new(r"^\d{1,12}(\.\d{1,2})?$")?,
        })
    }

    pub fn validate_email(&self, value: &str) -> Result<(), FieldValidationError> {
        validate_text(value, 254)?;
        if self.email.is_match(value) {
            Ok(())
        } else {
            Err(FieldValidationError::InvalidEmail)
        }
    }

    pub fn validate_amount(&self, value: &str) -> Result<(), FieldValidationError> {
        if self.amount.is_match(value) {
            Ok(())
        } else {
            Err(FieldValidationError::InvalidAmount)
        }
    }
}
