//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use newsdesk_core::{AnyStore, Executor, Initiator, Poller, QueueDispatcher};

use crate::config::Config;

/// State shared across all HTTP handlers.
///
/// Holds the only [`QueueDispatcher`]; dropping the last clone of the state
/// closes the work queue and lets the worker pool drain.
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    pub initiator: Initiator<AnyStore, QueueDispatcher>,
    pub poller: Poller<AnyStore>,
    /// Runs tasks in-request for the synchronous endpoint.
    pub executor: Executor,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<AnyStore>,
        dispatcher: QueueDispatcher,
        executor: Executor,
    ) -> Self {
        Self {
            config,
            initiator: Initiator::new(Arc::clone(&store), dispatcher),
            poller: Poller::new(store),
            executor,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}
