//! Error types for every stage of a process lifecycle.
//!
//! Failures that happen before a process id is handed out surface
//! synchronously ([`InitiateError`]); everything after that is recorded on the
//! process record and only observable by polling.

use std::time::Duration;

use thiserror::Error;

use crate::types::{ProcessId, ProcessStatus};

/// Errors raised by a [`crate::store::StatusStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists for the id.
    #[error("process {0} not found")]
    NotFound(ProcessId),

    /// The requested transition would move the record backwards or out of a
    /// terminal state.
    #[error("process {process_id}: illegal transition {from} -> {to}")]
    InvalidTransition {
        process_id: ProcessId,
        from: ProcessStatus,
        to: ProcessStatus,
    },

    /// Propagated from the SQLite (or other sqlx) pool.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row could not be decoded back into a record.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The backend is unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure to accept a submission. No process exists when this is returned.
#[derive(Debug, Error)]
pub enum InitiateError {
    #[error("submission failed: {0}")]
    Submission(#[source] StoreError),

    /// Dispatch was refused and the refusal could not be written to the
    /// record. The id is withheld since nothing would ever close it.
    #[error("dispatch failed ({dispatch}) and could not be recorded: {source}")]
    Unrecorded {
        dispatch: DispatchError,
        #[source]
        source: StoreError,
    },
}

/// Failure to hand a work item to the worker pool.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("work queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("worker pool has shut down")]
    Closed,
}

/// Failure of the task logic itself.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// An external provider answered with an error.
    #[error("{provider} provider error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// The request to an external provider could not be completed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Providers returned nothing to work with.
    #[error("no content: {0}")]
    NoContent(String),

    #[error("execution timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Failure to look up a process.
#[derive(Debug, Error)]
pub enum PollError {
    /// The id was never issued.
    #[error("process {0} not found")]
    NotFound(ProcessId),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for PollError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => PollError::NotFound(id),
            other => PollError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_reports_whole_seconds() {
        let e = TaskError::Timeout(Duration::from_millis(90_500));
        assert_eq!(e.to_string(), "execution timed out after 90s");
    }

    #[test]
    fn store_not_found_maps_to_poll_not_found() {
        let e: PollError = StoreError::NotFound(ProcessId::from("missing")).into();
        assert!(matches!(e, PollError::NotFound(id) if id.as_str() == "missing"));
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let e = StoreError::InvalidTransition {
            process_id: ProcessId::from("p1"),
            from: ProcessStatus::Completed,
            to: ProcessStatus::Failed,
        };
        assert_eq!(e.to_string(), "process p1: illegal transition COMPLETED -> FAILED");
    }
}
