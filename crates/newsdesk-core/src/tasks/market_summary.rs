//! `market-summary`: condense recent news coverage of a market topic into a
//! short briefing.
//!
//! Result schema:
//! ```json
//! { "topic": "...", "summary": "<markdown>", "articleCount": 3, "sources": [{ "title": "...", "url": "..." }] }
//! ```

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::info;

use super::text::{required, truncate_words};
use crate::error::TaskError;
use crate::providers::{LanguageModel, NewsSource};
use crate::types::MarketSummaryParams;

pub const DEFAULT_MAX_ARTICLES: u8 = 5;
pub const MAX_ARTICLES_LIMIT: u8 = 10;
/// Words of article text forwarded per article.
const EXCERPT_WORDS: usize = 400;

const ANALYST_PROMPT: &str = "\
You are a markets analyst. You will receive recent news items about one topic. Write a \
concise markdown briefing: a one-paragraph overview, the main market-moving developments \
as bullet points, and a short outlook. Only use facts present in the news items.";

pub struct MarketSummaryTask {
    news: Arc<dyn NewsSource>,
    model: Arc<dyn LanguageModel>,
}

impl MarketSummaryTask {
    pub fn new(news: Arc<dyn NewsSource>, model: Arc<dyn LanguageModel>) -> Self {
        Self { news, model }
    }

    pub async fn run(&self, params: &MarketSummaryParams) -> Result<Value, TaskError> {
        let topic = required("topic", &params.topic)?;
        let max_articles = params.max_articles.unwrap_or(DEFAULT_MAX_ARTICLES);
        if !(1..=MAX_ARTICLES_LIMIT).contains(&max_articles) {
            return Err(TaskError::InvalidParameters(format!(
                "maxArticles must be between 1 and {MAX_ARTICLES_LIMIT}, got {max_articles}"
            )));
        }

        let articles = self.news.search(topic, usize::from(max_articles)).await?;
        if articles.is_empty() {
            return Err(TaskError::NoContent(format!("no news articles found for {topic:?}")));
        }
        info!(topic, count = articles.len(), "summarizing market news");

        let mut prompt = format!("Topic: {topic}\n\n");
        for (i, article) in articles.iter().enumerate() {
            let excerpt = truncate_words(article.full_text().unwrap_or(&article.body), EXCERPT_WORDS);
            prompt.push_str(&format!(
                "## {}. {}\nDate: {}\nURL: {}\n\n{}\n\n",
                i + 1,
                article.title,
                article.date.as_deref().unwrap_or("unknown"),
                article.url,
                excerpt
            ));
        }

        let summary = self.model.complete(ANALYST_PROMPT, &prompt).await?;
        let sources: Vec<Value> = articles
            .iter()
            .map(|a| json!({ "title": a.title, "url": a.url }))
            .collect();

        Ok(json!({
            "topic": topic,
            "summary": summary,
            "articleCount": articles.len(),
            "sources": sources,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::fakes::*;

    fn params(topic: &str, max_articles: Option<u8>) -> MarketSummaryParams {
        MarketSummaryParams { topic: topic.into(), max_articles }
    }

    #[tokio::test]
    async fn summarizes_all_hits_in_one_call() {
        let news = Arc::new(FakeNews::with(vec![article(1, Some("full one")), article(2, None)]));
        let model = Arc::new(FakeModel::replying("prices up"));
        let task = MarketSummaryTask::new(news.clone(), model.clone());

        let result = task.run(&params("lithium", None)).await.unwrap();
        assert_eq!(result["summary"], "prices up");
        assert_eq!(result["articleCount"], 2);
        assert_eq!(result["sources"][0]["title"], "Headline 1");

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.contains("full one"), "prefers full text");
        assert!(calls[0].1.contains("Teaser 2"), "falls back to teaser");
        assert_eq!(
            news.queries.lock().unwrap().as_slice(),
            &[("lithium".to_owned(), usize::from(DEFAULT_MAX_ARTICLES))]
        );
    }

    #[tokio::test]
    async fn empty_search_is_no_content() {
        let task = MarketSummaryTask::new(
            Arc::new(FakeNews::with(Vec::new())),
            Arc::new(FakeModel::replying("unused")),
        );
        let err = task.run(&params("lithium", Some(3))).await.unwrap_err();
        assert!(matches!(err, TaskError::NoContent(_)));
    }

    #[tokio::test]
    async fn article_count_outside_range_is_invalid() {
        let task = MarketSummaryTask::new(
            Arc::new(FakeNews::with(Vec::new())),
            Arc::new(FakeModel::replying("unused")),
        );
        for bad in [0, MAX_ARTICLES_LIMIT + 1] {
            let err = task.run(&params("lithium", Some(bad))).await.unwrap_err();
            assert!(matches!(err, TaskError::InvalidParameters(_)), "{bad}");
        }
        let err = task.run(&params("", None)).await.unwrap_err();
        assert!(matches!(err, TaskError::InvalidParameters(_)));
    }
}
