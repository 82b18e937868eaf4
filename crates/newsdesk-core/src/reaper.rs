//! Stale-record reaper.
//!
//! A worker that is killed mid-run never writes a terminal status. The reaper
//! periodically fails `PROCESSING` records that have not moved for longer
//! than `stale_after`, going through the same monotonic `update` as everyone
//! else, so a worker that finishes late is rejected instead of overwriting it.
//! Queued `PENDING` work is left alone. `stale_after` must exceed the longest
//! run the pool allows, or healthy runs get reaped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::store::StatusStore;
use crate::types::StatusUpdate;

pub struct Reaper<S> {
    store: Arc<S>,
    stale_after: Duration,
}

impl<S: StatusStore> Reaper<S> {
    pub fn new(store: Arc<S>, stale_after: Duration) -> Self {
        Self { store, stale_after }
    }

    /// Fail every `PROCESSING` record older than `stale_after`.
    /// Returns how many records were changed.
    pub async fn sweep(&self) -> Result<usize, StoreError> {
        let age = chrono::Duration::from_std(self.stale_after)
            .map_err(|e| StoreError::Corrupt(format!("stale_after out of range: {e}")))?;
        let Some(cutoff) = Utc::now().checked_sub_signed(age) else {
            return Ok(0);
        };

        let stale = self.store.list_stale(cutoff).await?;
        let detail = format!(
            "abandoned: no terminal update within {:?}",
            self.stale_after
        );

        let mut reaped = 0;
        for record in stale {
            match self
                .store
                .update(&record.process_id, StatusUpdate::Failed(detail.clone()))
                .await
            {
                Ok(_) => {
                    reaped += 1;
                    warn!(process_id = %record.process_id, from = %record.status, "reaped stale process");
                }
                // Finished between the listing and the update.
                Err(StoreError::InvalidTransition { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(reaped)
    }

    /// Run [`Reaper::sweep`] every `interval` until the handle is aborted.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        info!(
            stale_after_secs = self.stale_after.as_secs(),
            interval_secs = interval.as_secs(),
            "reaper started"
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.sweep().await {
                    Ok(0) => debug!("reaper sweep found nothing"),
                    Ok(n) => info!(reaped = n, "reaper sweep finished"),
                    Err(e) => error!(error = %e, "reaper sweep failed"),
                }
            }
        })
    }
}
