//! Worker lifecycle wrapper.
//!
//! [`Executor`] runs task logic under a soft time budget and converts panics
//! into errors; it is shared by the asynchronous [`Worker`] and the
//! synchronous entry point. [`Worker`] adds the process-record lifecycle
//! around it: `PROCESSING` on pick-up, then exactly one terminal write.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde_json::Value;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::dispatch::WorkItem;
use crate::error::{StoreError, TaskError};
use crate::store::StatusStore;
use crate::tasks::TaskRunner;
use crate::types::{StatusUpdate, TaskRequest};

/// Runs a [`TaskRequest`] to completion or failure.
#[derive(Clone)]
pub struct Executor {
    runner: Arc<dyn TaskRunner>,
    budget: Duration,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor").field("budget", &self.budget).finish()
    }
}

impl Executor {
    /// * `runner` – task logic.
    /// * `budget` – soft execution ceiling; overrunning it is a task failure.
    pub fn new(runner: Arc<dyn TaskRunner>, budget: Duration) -> Self {
        Self { runner, budget }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Run the task. Every failure mode the process can observe (provider
    /// error, timeout, panic) comes back as a [`TaskError`].
    pub async fn run(&self, request: &TaskRequest) -> Result<Value, TaskError> {
        let started = Instant::now();
        let guarded = AssertUnwindSafe(self.runner.run(request)).catch_unwind();
        let outcome = match tokio::time::timeout(self.budget, guarded).await {
            Err(_) => Err(TaskError::Timeout(self.budget)),
            Ok(Err(panic)) => Err(TaskError::Panicked(panic_message(panic.as_ref()))),
            Ok(Ok(result)) => result,
        };
        debug!(
            task_type = %request.task_type(),
            elapsed_ms = started.elapsed().as_millis(),
            ok = outcome.is_ok(),
            "task run finished"
        );
        outcome
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// Executes dispatched work items and records their outcome.
pub struct Worker<S> {
    store: Arc<S>,
    executor: Executor,
}

impl<S: StatusStore> Worker<S> {
    pub fn new(store: Arc<S>, executor: Executor) -> Self {
        Self { store, executor }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Execute one work item. Results are delivered through the store only.
    pub async fn execute(&self, item: WorkItem) {
        let span = info_span!(
            "execute",
            process_id = %item.process_id,
            task_type = %item.request.task_type(),
        );
        self.execute_inner(item).instrument(span).await
    }

    async fn execute_inner(&self, item: WorkItem) {
        match self.store.update(&item.process_id, StatusUpdate::Processing).await {
            Ok(_) => debug!("process picked up"),
            Err(StoreError::InvalidTransition { from, .. }) => {
                warn!(%from, "process already terminal; skipping execution");
                return;
            }
            Err(StoreError::NotFound(_)) => {
                error!("dispatched process has no record; skipping execution");
                return;
            }
            // Pick-up is informational only; the terminal write still decides.
            Err(e) => warn!(error = %e, "failed to mark process PROCESSING; continuing"),
        }

        let update = match self.executor.run(&item.request).await {
            Ok(result) => StatusUpdate::Completed(result),
            Err(e) => {
                warn!(error = %e, "task failed");
                StatusUpdate::Failed(e.to_string())
            }
        };
        let status = update.status();

        match self.store.update(&item.process_id, update).await {
            Ok(_) => info!(%status, "process finished"),
            Err(e @ StoreError::InvalidTransition { .. }) => {
                warn!(error = %e, %status, "terminal write rejected; record was already closed")
            }
            Err(e) => error!(
                error = %e,
                %status,
                "failed to record terminal status; record left non-terminal"
            ),
        }
    }
}
