//! Progress publishing
//!
//! The orchestrator reports through a [`ProgressPublisher`], which decides when
//! a snapshot is due and hands it to a [`ProgressSink`]. The sink is the only
//! transport-specific piece; [`progress_channel`] provides the in-process one
//! used by the HTTP layer.
//!
//! Delivery never blocks row processing. A sink that stops accepting
//! snapshots (consumer gone, lifetime exceeded) is logged once and the job
//! carries on to completion.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::job::JobState;
use super::types::{FieldError, ImportStatus};

/// Immutable view of a job, as sent to the consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub status: ImportStatus,
    pub total_records: usize,
    pub processed_records: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub duplicate_count: usize,
    pub skipped_count: usize,
    pub progress_percentage: u8,
    pub message: String,
    /// Present only on the terminal snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ProgressSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// What travels over a progress channel
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Snapshot(ProgressSnapshot),
    /// Engine-level failure; always the last event of a failed job
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("progress consumer disconnected")]
    Disconnected,
    #[error("progress channel lifetime exceeded")]
    Expired,
}

/// Transport for progress events of one job
///
/// A sink has exactly one writer. Emission must not wait for the consumer.
pub trait ProgressSink: Send + 'static {
    fn emit(&mut self, snapshot: ProgressSnapshot) -> Result<(), PublishError>;

    /// Signal an engine-level failure to the consumer
    fn fail(&mut self, message: String) -> Result<(), PublishError>;

    /// Called exactly once, after the last event
    fn close(&mut self) {}
}

/// Create the in-process channel for one job
///
/// Events sent after `lifetime` has elapsed are refused with
/// [`PublishError::Expired`], and the receiving side stops yielding at the same
/// deadline.
pub fn progress_channel(lifetime: Duration) -> (ChannelSink, ProgressReceiver) {
    let (sender, events) = mpsc::unbounded_channel();
    let deadline = Instant::now() + lifetime;
    (
        ChannelSink {
            sender: Some(sender),
            deadline,
        },
        ProgressReceiver { events, deadline },
    )
}

pub struct ChannelSink {
    sender: Option<mpsc::UnboundedSender<ProgressEvent>>,
    deadline: Instant,
}

impl ChannelSink {
    fn send(&mut self, event: ProgressEvent) -> Result<(), PublishError> {
        if Instant::now() >= self.deadline {
            return Err(PublishError::Expired);
        }
        let sender = self.sender.as_ref().ok_or(PublishError::Disconnected)?;
        sender.send(event).map_err(|_| PublishError::Disconnected)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&mut self, snapshot: ProgressSnapshot) -> Result<(), PublishError> {
        self.send(ProgressEvent::Snapshot(snapshot))
    }

    fn fail(&mut self, message: String) -> Result<(), PublishError> {
        self.send(ProgressEvent::Error(message))
    }

    fn close(&mut self) {
        self.sender = None;
    }
}

/// Consumer side of a job's progress channel
pub struct ProgressReceiver {
    events: mpsc::UnboundedReceiver<ProgressEvent>,
    deadline: Instant,
}

impl ProgressReceiver {
    /// Next event, or `None` once the channel is closed or its lifetime is over
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        tokio::time::timeout_at(self.deadline, self.events.recv())
            .await
            .ok()
            .flatten()
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Events as a stream that ends on close or at the deadline
    pub fn into_stream(self) -> impl futures::Stream<Item = ProgressEvent> + Send + 'static {
        use futures::StreamExt;

        UnboundedReceiverStream::new(self.events)
            .take_until(tokio::time::sleep_until(self.deadline))
    }
}

/// Decides when snapshots are due and which message they carry
pub struct ProgressPublisher<S: ProgressSink> {
    sink: S,
    interval: usize,
    delivery_lost: bool,
}

impl<S: ProgressSink> ProgressPublisher<S> {
    /// `interval` is the number of processed rows between progress snapshots
    pub fn new(sink: S, interval: usize) -> Self {
        Self {
            sink,
            interval: interval.max(1),
            delivery_lost: false,
        }
    }

    /// Start snapshot; an empty job has only its terminal snapshot
    pub fn started(&mut self, state: &JobState) {
        if state.total() == 0 {
            return;
        }
        let message = format!("Import started: {} records", state.total());
        self.publish(state.snapshot(message));
    }

    /// Snapshot after every `interval` rows, except after the last row
    pub fn row_processed(&mut self, state: &JobState) {
        let processed = state.processed();
        if processed < state.total() && processed % self.interval == 0 {
            let message = format!("Processed {} of {} records", processed, state.total());
            self.publish(state.snapshot(message));
        }
    }

    /// Terminal snapshot with the full error list, then close
    pub fn finished(mut self, state: &JobState) -> ProgressSnapshot {
        let snapshot = state.snapshot(terminal_message(state, None));
        self.publish(snapshot.clone());
        self.sink.close();
        snapshot
    }

    /// Best-effort terminal snapshot for a failed job, then the error signal, then close
    pub fn aborted(mut self, state: &JobState, cause: &str) -> ProgressSnapshot {
        let snapshot = state.snapshot(terminal_message(state, Some(cause)));
        self.publish(snapshot.clone());
        if !self.delivery_lost {
            if let Err(e) = self.sink.fail(cause.to_string()) {
                self.delivery_failed(e);
            }
        }
        self.sink.close();
        snapshot
    }

    fn publish(&mut self, snapshot: ProgressSnapshot) {
        if self.delivery_lost {
            return;
        }
        if let Err(e) = self.sink.emit(snapshot) {
            self.delivery_failed(e);
        }
    }

    fn delivery_failed(&mut self, error: PublishError) {
        self.delivery_lost = true;
        tracing::warn!(
            error = %error,
            "Progress delivery stopped, import continues without an observer"
        );
    }
}

/// Terminal message; the counts always match the snapshot's counters
pub fn terminal_message(state: &JobState, cause: Option<&str>) -> String {
    match (state.status(), cause) {
        (ImportStatus::Failed, Some(cause)) => {
            format!("Import failed: {}. {}", cause, state.summary())
        }
        (ImportStatus::Failed, None) => format!("Import failed. {}", state.summary()),
        (ImportStatus::CompletedWithErrors, _) => {
            format!("Import completed with errors. {}", state.summary())
        }
        (ImportStatus::Completed, _) => format!("Import completed. {}", state.summary()),
        (ImportStatus::Processing, _) => format!("Import in progress. {}", state.summary()),
    }
}
