//! Submission entry point.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::dispatch::{Dispatch, WorkItem};
use crate::error::InitiateError;
use crate::store::StatusStore;
use crate::types::{ProcessId, ProcessRecord, StatusUpdate, TaskRequest};

/// Accepts work, records it as `PENDING` and dispatches it without waiting.
pub struct Initiator<S, D> {
    store: Arc<S>,
    dispatcher: D,
}

impl<S: StatusStore, D: Dispatch> Initiator<S, D> {
    pub fn new(store: Arc<S>, dispatcher: D) -> Self {
        Self { store, dispatcher }
    }

    /// Persist a `PENDING` record, then hand the work off.
    ///
    /// The record is written before dispatch, so a poll made with the returned
    /// id always finds it. If the store write fails nothing is dispatched and
    /// the caller gets an error instead of an id. A dispatch failure after the
    /// write is recorded on the process as `FAILED`; if even that write fails
    /// the caller gets [`InitiateError::Unrecorded`].
    pub async fn initiate(&self, request: TaskRequest) -> Result<ProcessId, InitiateError> {
        let process_id = ProcessId::generate();
        let task_type = request.task_type();

        let record = ProcessRecord::pending(process_id.clone(), &request, Utc::now())
            .map_err(InitiateError::Submission)?;
        self.store
            .put(record)
            .await
            .map_err(InitiateError::Submission)?;
        info!(%process_id, %task_type, "process accepted");

        let item = WorkItem { process_id: process_id.clone(), request };
        if let Err(e) = self.dispatcher.dispatch(item) {
            warn!(%process_id, error = %e, "dispatch failed");
            let detail = format!("dispatch failed: {e}");
            if let Err(store_err) = self
                .store
                .update(&process_id, StatusUpdate::Failed(detail))
                .await
            {
                error!(
                    %process_id,
                    error = %store_err,
                    "could not record dispatch failure; withholding process id"
                );
                return Err(InitiateError::Unrecorded { dispatch: e, source: store_err });
            }
        }

        Ok(process_id)
    }
}
