//! Server-Sent Events transport for import progress
//!
//! Streams events:
//! - `progress` (snapshot of a running job)
//! - `complete` (terminal snapshot, carries the error list)
//! - `error` (engine-level failure, always last)

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tracing::warn;

use crate::import::{ProgressEvent, ProgressReceiver};

/// Interval of keep-alive comments while rows are being processed
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Stream a job's progress channel until it closes or its lifetime elapses
pub fn progress_stream(
    receiver: ProgressReceiver,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = receiver
        .into_stream()
        .filter_map(|event| async move { to_sse_event(event).map(Ok) });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL).text("heartbeat"))
}

/// SSE event name for a progress event
pub fn event_name(event: &ProgressEvent) -> &'static str {
    match event {
        ProgressEvent::Snapshot(snapshot) if snapshot.is_terminal() => "complete",
        ProgressEvent::Snapshot(_) => "progress",
        ProgressEvent::Error(_) => "error",
    }
}

fn to_sse_event(event: ProgressEvent) -> Option<Event> {
    let name = event_name(&event);
    match event {
        ProgressEvent::Snapshot(snapshot) => match Event::default().event(name).json_data(&snapshot) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("SSE: Failed to serialize {} snapshot: {}", name, e);
                None
            }
        },
        ProgressEvent::Error(message) => Some(Event::default().event(name).data(message)),
    }
}
