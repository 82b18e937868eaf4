//! Asynchronous process execution for long-running newsroom tasks.
//!
//! A caller submits a [`TaskRequest`] through the [`Initiator`] and gets a
//! [`ProcessId`] back immediately. A [`Worker`] picks the work up from the
//! [`WorkerPool`], runs it through the [`Executor`] and records the outcome in
//! the [`StatusStore`]. The caller follows progress with the [`Poller`].
//! The same [`Executor`] also backs a synchronous path that keeps no record.

pub mod dispatch;
pub mod error;
pub mod initiator;
pub mod poller;
pub mod providers;
pub mod reaper;
pub mod store;
pub mod tasks;
pub mod types;
pub mod worker;

pub use dispatch::{Dispatch, PoolConfig, QueueDispatcher, WorkItem, WorkerPool};
pub use error::{DispatchError, InitiateError, PollError, StoreError, TaskError};
pub use initiator::Initiator;
pub use poller::Poller;
pub use reaper::Reaper;
pub use store::{AnyStore, MemoryStore, SqliteStore, StatusStore};
pub use tasks::{TaskCatalog, TaskRunner};
pub use types::{
    MarketSummaryParams, NewsArticleParams, ProcessId, ProcessRecord, ProcessStatus, StatusUpdate,
    TaskRequest, TaskType,
};
pub use worker::{Executor, Worker};
