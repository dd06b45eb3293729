//! Upload orchestration
//!
//! Drives the row loop of one import job. The job's [`JobState`] lives on the
//! task running [`run_import`] and nothing else touches it. Rows are handled
//! one at a time, in file order.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use super::classifier::{classify, panic_message, ImportError};
use super::job::JobState;
use super::pipeline::RowPipeline;
use super::progress::{progress_channel, ProgressPublisher, ProgressReceiver, ProgressSink, ProgressSnapshot};
use super::types::{row_number, RowOutcome};
use crate::config::ImportConfig;

/// A running import
pub struct ImportHandle {
    pub job_id: Uuid,
    /// Progress events of this job; the only observer it will ever have
    pub receiver: ProgressReceiver,
    /// Resolves to the terminal snapshot. Dropping it does not stop the job.
    pub task: JoinHandle<ProgressSnapshot>,
}

/// Start an import on its own task and return immediately
pub fn spawn_import<P: RowPipeline>(
    pipeline: Arc<P>,
    rows: Vec<P::Row>,
    config: &ImportConfig,
) -> ImportHandle {
    let job_id = Uuid::new_v4();
    let (sink, receiver) = progress_channel(config.stream_lifetime());
    let publisher = ProgressPublisher::new(sink, config.progress_interval);

    let span = tracing::info_span!(
        "import_job",
        %job_id,
        entity = pipeline.entity(),
        total = rows.len()
    );
    let task = tokio::spawn(
        async move { run_import(pipeline.as_ref(), rows, publisher).await }.instrument(span),
    );

    ImportHandle {
        job_id,
        receiver,
        task,
    }
}

/// Process every row and publish progress; returns the terminal snapshot
///
/// Row-level failures are recorded and the loop moves on. A fault outside the
/// per-row boundary stops the loop, marks the job `FAILED`, publishes what was
/// accumulated so far and closes the channel with an error signal.
pub async fn run_import<P, S>(
    pipeline: &P,
    rows: Vec<P::Row>,
    mut publisher: ProgressPublisher<S>,
) -> ProgressSnapshot
where
    P: RowPipeline,
    S: ProgressSink,
{
    let mut state = JobState::new(rows.len());
    tracing::info!(entity = pipeline.entity(), total = state.total(), "Import started");
    publisher.started(&state);

    for (index, row) in rows.iter().enumerate() {
        let row_number = row_number(index);

        let classified = AssertUnwindSafe(classify(pipeline, row, row_number))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(ImportError::Panicked {
                    row_number,
                    message: panic_message(payload.as_ref()),
                })
            });

        let outcome = match classified {
            Ok(outcome) => outcome,
            Err(error) => return abort(state, publisher, error),
        };

        if !matches!(outcome, RowOutcome::Success) {
            tracing::debug!(row_number, outcome = outcome.label(), "Row skipped");
        }
        state.record(outcome);
        publisher.row_processed(&state);
    }

    let status = state.complete();
    tracing::info!(
        %status,
        processed = state.processed(),
        success = state.success(),
        failure = state.failure(),
        duplicate = state.duplicate(),
        "Import finished"
    );
    publisher.finished(&state)
}

fn abort<S: ProgressSink>(
    mut state: JobState,
    publisher: ProgressPublisher<S>,
    error: ImportError,
) -> ProgressSnapshot {
    tracing::error!(
        error = %error,
        row_number = error.row_number(),
        processed = state.processed(),
        "Import aborted"
    );
    state.fail();
    publisher.aborted(&state, &error.to_string())
}
