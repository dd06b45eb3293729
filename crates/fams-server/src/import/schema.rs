//! Column schemas
//!
//! A schema is declared once per entity and drives the upload template, the
//! required-column check when a sheet is read, required-field validation and
//! the column layout of error reports.

use crate::import::types::{FieldError, RowSnapshot};
use serde::Serialize;

/// Marker appended to required column names in templates
pub const REQUIRED_MARKER: char = '*';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub required: bool,
}

impl Column {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
        }
    }

    /// Header cell as written to templates (`code*` for required columns)
    pub fn header(&self) -> String {
        if self.required {
            format!("{}{}", self.name, REQUIRED_MARKER)
        } else {
            self.name.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub entity: &'static str,
    pub columns: &'static [Column],
}

impl ColumnSchema {
    pub fn required_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| column.required)
    }

    /// One validation error per required column that is absent, null or blank in the row
    pub fn missing_required(&self, snapshot: &RowSnapshot, row_number: usize) -> Vec<FieldError> {
        self.required_columns()
            .filter(|column| is_blank(snapshot.get(column.name)))
            .map(|column| {
                FieldError::validation(row_number, column.name, format!("{} is required", column.name))
            })
            .collect()
    }
}

fn is_blank(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA: ColumnSchema = ColumnSchema {
        entity: "widgets",
        columns: &[
            Column::required("code"),
            Column::required("name"),
            Column::optional("notes"),
        ],
    };

    #[test]
    fn test_header_marks_required_columns() {
        let headers: Vec<String> = SCHEMA.columns.iter().map(Column::header).collect();
        assert_eq!(headers, vec!["code*", "name*", "notes"]);
    }

    #[test]
    fn test_required_columns() {
        let names: Vec<&str> = SCHEMA.required_columns().map(|c| c.name).collect();
        assert_eq!(names, vec!["code", "name"]);
    }

    #[test]
    fn test_missing_required_reports_each_blank_field() {
        let snapshot = RowSnapshot::from([
            ("code".to_string(), json!("  ")),
            ("name".to_string(), serde_json::Value::Null),
            ("notes".to_string(), json!("ok")),
        ]);

        let errors = SCHEMA.missing_required(&snapshot, 4);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field_name.as_deref(), Some("code"));
        assert_eq!(errors[0].message, "code is required");
        assert_eq!(errors[1].field_name.as_deref(), Some("name"));
        assert!(errors.iter().all(|e| e.row_number == 4));
    }

    #[test]
    fn test_missing_required_accepts_complete_row() {
        let snapshot = RowSnapshot::from([
            ("code".to_string(), json!("W-1")),
            ("name".to_string(), json!("Widget")),
        ]);
        assert!(SCHEMA.missing_required(&snapshot, 2).is_empty());
    }
}
