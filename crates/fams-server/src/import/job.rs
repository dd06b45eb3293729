//! Job state and counters
//!
//! A [`JobState`] is owned by the single task running the import and mutated
//! only through [`JobState::record`] and the terminal transitions.

use super::progress::ProgressSnapshot;
use super::types::{FieldError, ImportStatus, RowOutcome};

#[derive(Debug, Clone)]
pub struct JobState {
    total: usize,
    processed: usize,
    success: usize,
    failure: usize,
    duplicate: usize,
    skipped: usize,
    errors: Vec<FieldError>,
    status: ImportStatus,
}

impl JobState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            success: 0,
            failure: 0,
            duplicate: 0,
            skipped: 0,
            errors: Vec::new(),
            status: ImportStatus::Processing,
        }
    }

    /// Count one classified row and keep its errors
    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Success => self.success += 1,
            RowOutcome::ValidationFailure(errors) => {
                self.failure += 1;
                self.skipped += 1;
                self.errors.extend(errors);
            }
            RowOutcome::ProcessingFailure(error) => {
                self.failure += 1;
                self.skipped += 1;
                self.errors.push(error);
            }
            RowOutcome::Duplicate(error) => {
                self.duplicate += 1;
                self.skipped += 1;
                self.errors.push(error);
            }
        }
        self.processed += 1;
        debug_assert!(self.is_reconciled(), "counters out of balance: {:?}", self);
    }

    /// Leave `Processing` after every row was classified
    ///
    /// Returns the terminal status. Has no effect once a terminal status was reached.
    pub fn complete(&mut self) -> ImportStatus {
        if !self.status.is_terminal() {
            self.status = if self.has_errors() {
                ImportStatus::CompletedWithErrors
            } else {
                ImportStatus::Completed
            };
        }
        self.status
    }

    /// Leave `Processing` after an engine-level fault, keeping the counters accumulated so far
    pub fn fail(&mut self) -> ImportStatus {
        if !self.status.is_terminal() {
            self.status = ImportStatus::Failed;
        }
        self.status
    }

    pub fn has_errors(&self) -> bool {
        self.failure > 0 || self.duplicate > 0
    }

    pub fn is_reconciled(&self) -> bool {
        self.success + self.failure + self.duplicate == self.processed
            && self.skipped == self.failure + self.duplicate
            && self.processed <= self.total
    }

    /// `processed * 100 / total`, 0 for an empty batch
    pub fn progress_percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        // processed never exceeds total, so the result fits in 0..=100
        u8::try_from(self.processed * 100 / self.total).unwrap_or(100)
    }

    /// "Success: N, Failed: N, Duplicates: N, Skipped: N"
    pub fn summary(&self) -> String {
        format!(
            "Success: {}, Failed: {}, Duplicates: {}, Skipped: {}",
            self.success, self.failure, self.duplicate, self.skipped
        )
    }

    /// Copy the current counters into a snapshot
    ///
    /// The error list is attached only once the job is terminal.
    pub fn snapshot(&self, message: impl Into<String>) -> ProgressSnapshot {
        ProgressSnapshot {
            status: self.status,
            total_records: self.total,
            processed_records: self.processed,
            success_count: self.success,
            failure_count: self.failure,
            duplicate_count: self.duplicate,
            skipped_count: self.skipped,
            progress_percentage: self.progress_percentage(),
            message: message.into(),
            errors: self.status.is_terminal().then(|| self.errors.clone()),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn success(&self) -> usize {
        self.success
    }

    pub fn failure(&self) -> usize {
        self.failure
    }

    pub fn duplicate(&self) -> usize {
        self.duplicate
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn status(&self) -> ImportStatus {
        self.status
    }
}
