//! Error report replay and upload templates
//!
//! Both artifacts are CSV, the same spreadsheet format uploads are read in, so
//! a downloaded template can be filled in and uploaded as is and a report opens
//! in any spreadsheet tool. They are rendered purely from their inputs:
//! rendering the same errors against the same schema always produces the same
//! bytes.

use super::schema::ColumnSchema;
use super::types::FieldError;

/// Fixed leading columns of an error report
pub const REPORT_COLUMNS: [&str; 4] = ["Row Number", "Error Type", "Field", "Error Message"];

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to flush CSV: {0}")]
    Io(#[from] std::io::Error),
}

/// Render one row per error, in the given order, followed by the row's original values
pub fn render_error_report(
    errors: &[FieldError],
    schema: &ColumnSchema,
) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let header = REPORT_COLUMNS
        .iter()
        .copied()
        .chain(schema.columns.iter().map(|column| column.name));
    writer.write_record(header)?;

    for error in errors {
        let mut record = vec![
            error.row_number.to_string(),
            error.error_type.as_str().to_string(),
            error.field_name.clone().unwrap_or_default(),
            error.message.clone(),
        ];
        record.extend(
            schema
                .columns
                .iter()
                .map(|column| cell_text(error.row_snapshot.get(column.name))),
        );
        writer.write_record(&record)?;
    }

    finish(writer)
}

/// Header-only CSV for an entity; required columns carry a trailing `*`
pub fn render_template(schema: &ColumnSchema) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(schema.columns.iter().map(|column| column.header()))?;
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ReportError> {
    writer
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))
}

fn cell_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::schema::Column;
    use crate::import::types::{ErrorType, RowSnapshot};
    use serde_json::json;

    const SCHEMA: ColumnSchema = ColumnSchema {
        entity: "facilities",
        columns: &[
            Column::required("code"),
            Column::required("name"),
            Column::optional("city"),
        ],
    };

    fn errors() -> Vec<FieldError> {
        let snapshot = RowSnapshot::from([
            ("code".to_string(), json!("HQ, North")),
            ("name".to_string(), serde_json::Value::Null),
            ("city".to_string(), json!(12)),
        ]);
        vec![
            FieldError::validation(3, "name", "name is required").tagged(
                3,
                ErrorType::Validation,
                &snapshot,
            ),
            FieldError::duplicate(5, RowSnapshot::from([("code".to_string(), json!("B-2"))])),
        ]
    }

    #[test]
    fn test_error_report_layout() {
        let bytes = render_error_report(&errors(), &SCHEMA).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Row Number,Error Type,Field,Error Message,code,name,city");
        assert_eq!(lines[1], "3,VALIDATION,name,name is required,\"HQ, North\",,12");
        assert_eq!(lines[2], "5,DUPLICATE,,Duplicate record found,B-2,,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_error_report_is_idempotent() {
        let first = render_error_report(&errors(), &SCHEMA).unwrap();
        let second = render_error_report(&errors(), &SCHEMA).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_error_report_without_errors_has_header_only() {
        let bytes = render_error_report(&[], &SCHEMA).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Row Number,Error Type,Field,Error Message,code,name,city\n"
        );
    }

    #[test]
    fn test_template_marks_required_columns() {
        let bytes = render_template(&SCHEMA).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "code*,name*,city\n");
    }

    #[test]
    fn test_filled_template_uploads_as_is() {
        #[derive(Debug, serde::Deserialize)]
        struct Row {
            code: Option<String>,
            city: Option<String>,
        }

        let mut content = render_template(&SCHEMA).unwrap();
        content.extend_from_slice(b"HQ-1,Head office,Lyon\n");

        let rows: Vec<Row> = crate::import::sheet::read_rows(&content, &SCHEMA).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code.as_deref(), Some("HQ-1"));
        assert_eq!(rows[0].city.as_deref(), Some("Lyon"));
    }
}
