//! Work dispatch.
//!
//! The initiator hands accepted work to a [`Dispatch`] implementation and never
//! waits for it to run. [`QueueDispatcher`] feeds a bounded channel drained by
//! [`WorkerPool`], which runs each item as an independent tokio task with
//! bounded concurrency.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::error::DispatchError;
use crate::store::StatusStore;
use crate::types::{ProcessId, TaskRequest};
use crate::worker::Worker;

/// One unit of asynchronous work: the process to advance and what to run.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub process_id: ProcessId,
    pub request: TaskRequest,
}

/// Non-blocking hand-off of work to the worker side.
pub trait Dispatch: Send + Sync + 'static {
    /// Enqueue `item`. Must return without waiting for the item to run.
    fn dispatch(&self, item: WorkItem) -> Result<(), DispatchError>;
}

/// Sending half of the worker pool's queue.
#[derive(Debug, Clone)]
pub struct QueueDispatcher {
    tx: mpsc::Sender<WorkItem>,
}

impl QueueDispatcher {
    /// Create a dispatcher and the receiver it feeds.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<WorkItem>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl Dispatch for QueueDispatcher {
    fn dispatch(&self, item: WorkItem) -> Result<(), DispatchError> {
        self.tx.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull {
                capacity: self.tx.max_capacity(),
            },
            mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Items that may wait for a free worker before dispatch is refused.
    pub queue_capacity: usize,
    /// Items executing at once.
    pub concurrency: usize,
    /// Abort an execution outright after this long. The record is left as
    /// the worker last wrote it.
    pub hard_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            concurrency: 4,
            hard_timeout: None,
        }
    }
}

/// Drains the dispatch queue and runs each item on a [`Worker`].
pub struct WorkerPool<S> {
    worker: Arc<Worker<S>>,
    rx: mpsc::Receiver<WorkItem>,
    permits: Arc<Semaphore>,
    hard_timeout: Option<Duration>,
}

impl<S: StatusStore> WorkerPool<S> {
    /// Spawn the pool on the current runtime.
    ///
    /// The returned handle completes once every [`QueueDispatcher`] clone has
    /// been dropped and all in-flight work has finished.
    pub fn start(worker: Arc<Worker<S>>, config: PoolConfig) -> (QueueDispatcher, JoinHandle<()>) {
        let (dispatcher, rx) = QueueDispatcher::channel(config.queue_capacity);
        let pool = Self {
            worker,
            rx,
            permits: Arc::new(Semaphore::new(config.concurrency.max(1))),
            hard_timeout: config.hard_timeout,
        };
        info!(
            queue_capacity = config.queue_capacity,
            concurrency = config.concurrency,
            hard_timeout_secs = config.hard_timeout.map(|d| d.as_secs()),
            "worker pool started"
        );
        let handle = tokio::spawn(pool.run().instrument(info_span!("worker_pool")));
        (dispatcher, handle)
    }

    async fn run(mut self) {
        let mut in_flight = JoinSet::new();

        while let Some(item) = self.rx.recv().await {
            // Reap finished executions so the set does not grow unbounded.
            while let Some(joined) = in_flight.try_join_next() {
                log_join(joined);
            }

            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                error!("worker pool semaphore closed; dropping remaining work");
                break;
            };
            let worker = Arc::clone(&self.worker);
            let hard_timeout = self.hard_timeout;
            debug!(process_id = %item.process_id, "starting execution");

            in_flight.spawn(async move {
                let _permit = permit;
                let process_id = item.process_id.clone();
                match hard_timeout {
                    None => worker.execute(item).await,
                    Some(limit) => {
                        if tokio::time::timeout(limit, worker.execute(item)).await.is_err() {
                            error!(
                                %process_id,
                                limit_secs = limit.as_secs(),
                                "execution aborted at hard timeout; no terminal status recorded"
                            );
                        }
                    }
                }
            });
        }

        info!(in_flight = in_flight.len(), "dispatch queue closed; draining");
        while let Some(joined) = in_flight.join_next().await {
            log_join(joined);
        }
        info!("worker pool stopped");
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!(error = %e, "execution task did not complete");
    }
}
