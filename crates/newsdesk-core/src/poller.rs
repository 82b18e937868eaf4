use std::sync::Arc;

use crate::error::PollError;
use crate::store::StatusStore;
use crate::types::{ProcessId, ProcessRecord};

/// Read-only view of process records.
pub struct Poller<S> {
    store: Arc<S>,
}

impl<S: StatusStore> Poller<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Current snapshot of the record. Never blocks on execution and never
    /// changes the record.
    pub async fn poll(&self, id: &ProcessId) -> Result<ProcessRecord, PollError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| PollError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{NewsArticleParams, ProcessStatus, TaskRequest};
    use chrono::Utc;

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let poller = Poller::new(Arc::new(MemoryStore::new()));
        let err = poller.poll(&ProcessId::from("nope")).await.unwrap_err();
        assert!(matches!(err, PollError::NotFound(id) if id.as_str() == "nope"));
    }

    #[tokio::test]
    async fn polling_does_not_mutate() {
        let store = Arc::new(MemoryStore::new());
        let id = ProcessId::generate();
        let request = TaskRequest::NewsArticle(NewsArticleParams { question: "q".into() });
        store
            .put(ProcessRecord::pending(id.clone(), &request, Utc::now()).unwrap())
            .await
            .unwrap();
        let poller = Poller::new(Arc::clone(&store));

        let first = poller.poll(&id).await.unwrap();
        let second = poller.poll(&id).await.unwrap();
        assert_eq!(first.status, ProcessStatus::Pending);
        assert_eq!(first.updated_at, second.updated_at);
    }
}
