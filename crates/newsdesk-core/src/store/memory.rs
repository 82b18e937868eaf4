use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::StatusStore;
use crate::error::StoreError;
use crate::types::{ProcessId, ProcessRecord, ProcessStatus, StatusUpdate};

/// In-process status store.
///
/// Uses a `tokio::sync::RwLock<HashMap>` so many pollers can read
/// concurrently while workers apply transitions. Every write is visible to
/// the next read as soon as the lock is released.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<ProcessId, ProcessRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl StatusStore for MemoryStore {
    async fn put(&self, record: ProcessRecord) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .insert(record.process_id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &ProcessId) -> Result<Option<ProcessRecord>, StoreError> {
        Ok(self.inner.read().await.get(id).cloned())
    }

    async fn update(&self, id: &ProcessId, update: StatusUpdate) -> Result<ProcessRecord, StoreError> {
        let mut guard = self.inner.write().await;
        let record = guard
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        record.apply(update, Utc::now())?;
        Ok(record.clone())
    }

    async fn list_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<ProcessRecord>, StoreError> {
        let guard = self.inner.read().await;
        let mut stale: Vec<ProcessRecord> = guard
            .values()
            .filter(|r| r.status == ProcessStatus::Processing && r.updated_at < cutoff)
            .cloned()
            .collect();
        stale.sort_by_key(|r| r.updated_at);
        Ok(stale)
    }

    async fn fail_unfinished(&self, detail: &str) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut changed = 0;
        for record in self.inner.write().await.values_mut() {
            if record.status.is_terminal() {
                continue;
            }
            record.apply(StatusUpdate::Failed(detail.to_owned()), now)?;
            changed += 1;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewsArticleParams, TaskRequest};
    use serde_json::json;

    fn pending(now: DateTime<Utc>) -> ProcessRecord {
        let request = TaskRequest::NewsArticle(NewsArticleParams {
            question: "fusion power".into(),
        });
        ProcessRecord::pending(ProcessId::generate(), &request, now).unwrap()
    }

    #[tokio::test]
    async fn put_then_get_reads_own_write() {
        let store = MemoryStore::new();
        let record = pending(Utc::now());
        store.put(record.clone()).await.unwrap();
        assert_eq!(store.get(&record.process_id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(&ProcessId::from("nope"), StatusUpdate::Processing)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_keeps_unrelated_fields() {
        let store = MemoryStore::new();
        let record = pending(Utc::now());
        store.put(record.clone()).await.unwrap();

        let updated = store
            .update(&record.process_id, StatusUpdate::Completed(json!({ "article": "..." })))
            .await
            .unwrap();
        assert_eq!(updated.status, ProcessStatus::Completed);
        assert_eq!(updated.task_type, record.task_type);
        assert_eq!(updated.parameters, record.parameters);
        assert_eq!(updated.created_at, record.created_at);
        assert!(updated.updated_at >= record.updated_at);
    }

    #[tokio::test]
    async fn terminal_record_rejects_further_updates() {
        let store = MemoryStore::new();
        let record = pending(Utc::now());
        store.put(record.clone()).await.unwrap();
        store
            .update(&record.process_id, StatusUpdate::Failed("boom".into()))
            .await
            .unwrap();

        let err = store
            .update(&record.process_id, StatusUpdate::Completed(json!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));

        let stored = store.get(&record.process_id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProcessStatus::Failed);
        assert_eq!(stored.error_detail.as_deref(), Some("boom"));
        assert!(stored.result.is_none());
    }

    #[tokio::test]
    async fn list_stale_only_returns_old_running_records() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let long_ago = now - chrono::TimeDelta::minutes(30);
        let mut old = pending(long_ago);
        old.apply(StatusUpdate::Processing, long_ago).unwrap();
        let mut fresh = pending(now);
        fresh.apply(StatusUpdate::Processing, now).unwrap();
        // Queued work is never stale, however long it has waited.
        let queued = pending(long_ago);
        let mut done = pending(long_ago);
        done.apply(StatusUpdate::Completed(json!(null)), now - chrono::TimeDelta::minutes(29))
            .unwrap();
        for r in [old.clone(), fresh, queued, done] {
            store.put(r).await.unwrap();
        }

        let stale = store
            .list_stale(now - chrono::TimeDelta::minutes(10))
            .await
            .unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].process_id, old.process_id);
    }

    #[tokio::test]
    async fn fail_unfinished_only_touches_non_terminal() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let a = pending(now);
        let mut b = pending(now);
        b.apply(StatusUpdate::Processing, now).unwrap();
        let mut c = pending(now);
        c.apply(StatusUpdate::Completed(json!("done")), now).unwrap();
        for r in [a.clone(), b.clone(), c.clone()] {
            store.put(r).await.unwrap();
        }

        assert_eq!(store.fail_unfinished("interrupted").await.unwrap(), 2);
        for id in [&a.process_id, &b.process_id] {
            let r = store.get(id).await.unwrap().unwrap();
            assert_eq!(r.status, ProcessStatus::Failed);
            assert_eq!(r.error_detail.as_deref(), Some("interrupted"));
        }
        let r = store.get(&c.process_id).await.unwrap().unwrap();
        assert_eq!(r.status, ProcessStatus::Completed);
    }
}
