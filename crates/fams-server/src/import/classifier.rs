//! Row classification
//!
//! Applies a [`RowPipeline`] to one row and produces exactly one [`RowOutcome`].
//! Conversion and persistence run inside a failure boundary: errors and panics
//! from either step become a processing failure for that row only.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use super::pipeline::RowPipeline;
use super::types::{snapshot_of, ErrorType, FieldError, RowOutcome};

/// Engine-level faults. Any of these aborts the job with status `FAILED`.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("duplicate check failed at row {row_number}: {source:#}")]
    DuplicateCheck {
        row_number: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error("unexpected panic at row {row_number}: {message}")]
    Panicked { row_number: usize, message: String },
}

impl ImportError {
    pub fn row_number(&self) -> usize {
        match self {
            ImportError::DuplicateCheck { row_number, .. } => *row_number,
            ImportError::Panicked { row_number, .. } => *row_number,
        }
    }
}

/// Classify one row
///
/// Validation errors are tagged `VALIDATION`, a match against committed state
/// yields one `DUPLICATE` error, and a failing or panicking convert/persist
/// yields one `ERROR` carrying the failure message. Every error carries the
/// row's values.
///
/// Only a failing duplicate check escapes as an [`ImportError`].
pub async fn classify<P: RowPipeline>(
    pipeline: &P,
    row: &P::Row,
    row_number: usize,
) -> Result<RowOutcome, ImportError> {
    let snapshot = snapshot_of(row);

    let errors = pipeline.validate(row, row_number);
    if !errors.is_empty() {
        let errors = errors
            .into_iter()
            .map(|error| error.tagged(row_number, ErrorType::Validation, &snapshot))
            .collect();
        return Ok(RowOutcome::ValidationFailure(errors));
    }

    let duplicate = pipeline
        .is_duplicate(row)
        .await
        .map_err(|source| ImportError::DuplicateCheck { row_number, source })?;
    if duplicate {
        return Ok(RowOutcome::Duplicate(FieldError::duplicate(row_number, snapshot)));
    }

    let committed = AssertUnwindSafe(async {
        let entity = pipeline.convert(row).await?;
        pipeline.persist(entity).await
    })
    .catch_unwind()
    .await;

    let message = match committed {
        Ok(Ok(())) => return Ok(RowOutcome::Success),
        Ok(Err(e)) => format!("{:#}", e),
        Err(payload) => panic_message(payload.as_ref()),
    };

    Ok(RowOutcome::ProcessingFailure(FieldError::processing(
        row_number, message, snapshot,
    )))
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
