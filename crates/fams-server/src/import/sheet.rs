//! Uploaded sheet decoding
//!
//! Turns an uploaded CSV file into the ordered row list an import job runs on.
//! Headers are matched case-insensitively and the required marker written by
//! the template is ignored, so a filled-in template uploads as is.
//!
//! Every data row must sit on its own line, directly below the previous one,
//! so that a row's number is its line in the file. Blank lines between rows
//! and line breaks inside quoted cells are rejected.

use serde::de::DeserializeOwned;

use super::schema::{ColumnSchema, REQUIRED_MARKER};
use super::types::row_number;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("File has no header row")]
    MissingHeader,
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Invalid CSV at line {line}: {message}")]
    Malformed { line: u64, message: String },
    #[error("Unexpected blank line or line break inside a cell at line {line}")]
    Misaligned { line: u64 },
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Decode all data rows, in file order
///
/// Blank cells decode as `None` for optional fields. Unknown columns are ignored.
pub fn read_rows<R: DeserializeOwned>(
    content: &[u8],
    schema: &ColumnSchema,
) -> Result<Vec<R>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content);

    let headers: csv::StringRecord = reader.headers()?.iter().map(normalize_header).collect();
    if headers.iter().all(str::is_empty) {
        return Err(SheetError::MissingHeader);
    }

    let missing: Vec<String> = schema
        .required_columns()
        .filter(|column| !headers.iter().any(|header| header == column.name))
        .map(|column| column.name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SheetError::MissingColumns(missing));
    }

    let mut start = reader.position().byte();
    if !spans_one_line(content, 0, start) {
        return Err(SheetError::Misaligned { line: 1 });
    }

    let mut record = csv::StringRecord::new();
    let mut rows = Vec::new();
    while reader.read_record(&mut record).map_err(malformed)? {
        let line = row_number(rows.len()) as u64;
        let end = reader.position().byte();
        if !spans_one_line(content, start, end) {
            return Err(SheetError::Misaligned { line });
        }
        start = end;

        let row = record
            .deserialize(Some(&headers))
            .map_err(|error| SheetError::Malformed {
                line,
                message: error_message(&error),
            })?;
        rows.push(row);
    }

    Ok(rows)
}

/// Whether the bytes the reader consumed for one record hold exactly one line
///
/// The reader skips blank lines before a record and keeps line breaks inside
/// quoted cells, so either shows up as an extra line break in the span. The
/// `\n` of a CRLF terminator is consumed with the following record.
fn spans_one_line(content: &[u8], start: u64, end: u64) -> bool {
    let (start, end) = (start as usize, end as usize);
    let Some(mut span) = content.get(start..end) else {
        return false;
    };

    let after_cr = start.checked_sub(1).and_then(|i| content.get(i)) == Some(&b'\r');
    if after_cr {
        span = span.strip_prefix(b"\n").unwrap_or(span);
    }

    let body = match span.split_last() {
        Some((&(b'\n' | b'\r'), body)) => body,
        _ => span,
    };
    !body.iter().any(|&b| matches!(b, b'\n' | b'\r'))
}

/// `" Code* "` -> `"code"`
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .trim_end_matches(REQUIRED_MARKER)
        .trim()
        .to_lowercase()
}

fn malformed(error: csv::Error) -> SheetError {
    match error.position() {
        Some(position) => SheetError::Malformed {
            line: position.line(),
            message: error_message(&error),
        },
        None => SheetError::Csv(error),
    }
}

fn error_message(error: &csv::Error) -> String {
    match error.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        _ => error.to_string(),
    }
}
