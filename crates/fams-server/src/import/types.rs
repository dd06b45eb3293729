//! Core types for the bulk import engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Line 1 of every upload is the header row, so the first data row is line 2.
pub const FIRST_DATA_ROW: usize = 2;

/// Message attached to every duplicate row
pub const DUPLICATE_MESSAGE: &str = "Duplicate record found";

/// Spreadsheet line number of the row at `index` (0-based) in the parsed batch
pub fn row_number(index: usize) -> usize {
    index + FIRST_DATA_ROW
}

/// Column name to original cell value, kept with every error for reporting
pub type RowSnapshot = BTreeMap<String, serde_json::Value>;

/// Capture a row as a column/value map
///
/// Rows are serialized through serde, so the keys are the row's field names
/// (which are also the spreadsheet column names). A row that does not serialize
/// to a JSON object is stored under the `value` key.
pub fn snapshot_of<R: Serialize>(row: &R) -> RowSnapshot {
    match serde_json::to_value(row) {
        Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
        Ok(other) => BTreeMap::from([("value".to_string(), other)]),
        Err(e) => {
            tracing::warn!(error = %e, "Row could not be captured for the error report");
            RowSnapshot::new()
        }
    }
}

/// Error category of a recorded row failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    Validation,
    Duplicate,
    Error,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Validation => "VALIDATION",
            ErrorType::Duplicate => "DUPLICATE",
            ErrorType::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded problem with one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub row_number: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<String>,
    pub error_type: ErrorType,
    #[serde(default)]
    pub row_snapshot: RowSnapshot,
}

impl FieldError {
    /// A field-level validation problem, as produced by a pipeline's `validate`
    pub fn validation(
        row_number: usize,
        field_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row_number,
            field_name: Some(field_name.into()),
            message: message.into(),
            rejected_value: None,
            error_type: ErrorType::Validation,
            row_snapshot: RowSnapshot::new(),
        }
    }

    pub fn with_rejected_value(mut self, value: impl Into<String>) -> Self {
        self.rejected_value = Some(value.into());
        self
    }

    pub(crate) fn duplicate(row_number: usize, row_snapshot: RowSnapshot) -> Self {
        Self {
            row_number,
            field_name: None,
            message: DUPLICATE_MESSAGE.to_string(),
            rejected_value: None,
            error_type: ErrorType::Duplicate,
            row_snapshot,
        }
    }

    pub(crate) fn processing(row_number: usize, message: String, row_snapshot: RowSnapshot) -> Self {
        Self {
            row_number,
            field_name: None,
            message,
            rejected_value: None,
            error_type: ErrorType::Error,
            row_snapshot,
        }
    }

    /// Stamp the engine-owned parts: the row position, the category and the row values
    pub(crate) fn tagged(
        mut self,
        row_number: usize,
        error_type: ErrorType,
        row_snapshot: &RowSnapshot,
    ) -> Self {
        self.row_number = row_number;
        self.error_type = error_type;
        self.row_snapshot = row_snapshot.clone();
        self
    }
}

/// Classification of one processed row. Exactly one per row, never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Success,
    ValidationFailure(Vec<FieldError>),
    Duplicate(FieldError),
    ProcessingFailure(FieldError),
}

impl RowOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RowOutcome::Success => "success",
            RowOutcome::ValidationFailure(_) => "validation_failure",
            RowOutcome::Duplicate(_) => "duplicate",
            RowOutcome::ProcessingFailure(_) => "processing_failure",
        }
    }
}

/// Import job status: `Processing` until exactly one terminal state is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    Processing,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Processing => "PROCESSING",
            ImportStatus::Completed => "COMPLETED",
            ImportStatus::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            ImportStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ImportStatus::Processing)
    }
}

impl std::fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
