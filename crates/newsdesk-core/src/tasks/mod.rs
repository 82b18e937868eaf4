//! Task catalogue.
//!
//! [`TaskRunner`] is the seam between the process lifecycle (which never
//! inspects what a task does) and the task logic. [`TaskCatalog`] is the
//! production runner: it routes each [`TaskRequest`] variant to its task.

mod market_summary;
mod news_article;
mod text;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TaskError;
use crate::providers::{LanguageModel, NewsSource};
use crate::types::TaskRequest;

pub use market_summary::MarketSummaryTask;
pub use news_article::NewsArticleTask;

/// Runs the task-specific work for a request and returns its result payload.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, request: &TaskRequest) -> Result<Value, TaskError>;
}

/// Every task type this service knows how to run.
pub struct TaskCatalog {
    news_article: NewsArticleTask,
    market_summary: MarketSummaryTask,
}

impl TaskCatalog {
    pub fn new(news: Arc<dyn NewsSource>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            news_article: NewsArticleTask::new(Arc::clone(&news), Arc::clone(&model)),
            market_summary: MarketSummaryTask::new(news, model),
        }
    }
}

#[async_trait]
impl TaskRunner for TaskCatalog {
    async fn run(&self, request: &TaskRequest) -> Result<Value, TaskError> {
        match request {
            TaskRequest::NewsArticle(params) => self.news_article.run(params).await,
            TaskRequest::MarketSummary(params) => self.market_summary.run(params).await,
        }
    }
}
