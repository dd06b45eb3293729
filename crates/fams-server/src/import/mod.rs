//! Bulk import engine
//!
//! Runs an already-parsed batch of rows through an entity's [`RowPipeline`],
//! one row at a time, and streams progress to a single consumer:
//!
//! ```text
//! rows -> spawn_import -> [classify row -> JobState::record -> publisher] * N -> terminal snapshot
//! ```
//!
//! Per-row failures (validation, duplicates, conversion/persistence errors) are
//! recorded and never stop the batch. Only a fault outside the per-row boundary
//! ends a job early, with status `FAILED`.
//!
//! No job state outlives the job. Error reports are rendered from the error
//! list the caller received in the terminal snapshot.

pub mod classifier;
pub mod job;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod schema;
pub mod sheet;
pub mod types;

pub use classifier::{classify, ImportError};
pub use job::JobState;
pub use orchestrator::{run_import, spawn_import, ImportHandle};
pub use pipeline::RowPipeline;
pub use progress::{
    progress_channel, ChannelSink, ProgressEvent, ProgressPublisher, ProgressReceiver,
    ProgressSink, ProgressSnapshot, PublishError,
};
pub use report::{render_error_report, render_template, ReportError};
pub use schema::{Column, ColumnSchema};
pub use sheet::{read_rows, SheetError};
pub use types::{ErrorType, FieldError, ImportStatus, RowOutcome, RowSnapshot};
