//! `news-article`: research recent coverage of a question and write a
//! long-form article from it.
//!
//! Result schema:
//! ```json
//! { "topic": "<question>", "article": "<markdown>", "sources": [{ "title": "...", "url": "..." }] }
//! ```

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::info;

use super::text::{required, truncate_words, word_count};
use crate::error::TaskError;
use crate::providers::{LanguageModel, NewsArticle, NewsSource};
use crate::types::NewsArticleParams;

/// How many search hits to research.
pub const MAX_NEWS_RESULTS: usize = 5;
/// Word ceiling for a single summary and for the whole research digest.
pub const DIGEST_WORD_LIMIT: usize = 5000;

const SUMMARIZER_PROMPT: &str = "\
You are a senior newspaper editor. You will receive the full text of one news article. \
Read it carefully and write a factual report of under 500 words that keeps as many \
concrete details as possible. Format the report in markdown as:

**Overview:**
<overview of the article>

**Details:**
<facts and main points>

**Key Takeaways:**
<key takeaways>";

const WRITER_PROMPT: &str = "\
You are a senior newspaper editor writing tomorrow's cover story. You will receive a topic \
and research notes summarizing recent news articles. Think about the material, then write an \
engaging, well-structured markdown article with a catchy title, an overview that hooks the \
reader, titled sections with details and facts, a Takeaways section, and a References list \
of `- [Title](url)` links to the sources you used.";

pub struct NewsArticleTask {
    news: Arc<dyn NewsSource>,
    model: Arc<dyn LanguageModel>,
}

/// Research notes built from the summarized articles.
struct Digest {
    text: String,
    sources: Vec<Value>,
}

impl NewsArticleTask {
    pub fn new(news: Arc<dyn NewsSource>, model: Arc<dyn LanguageModel>) -> Self {
        Self { news, model }
    }

    pub async fn run(&self, params: &NewsArticleParams) -> Result<Value, TaskError> {
        let question = required("question", &params.question)?;

        let articles: Vec<NewsArticle> = self
            .news
            .search(question, MAX_NEWS_RESULTS)
            .await?
            .into_iter()
            .filter(|a| a.full_text().is_some())
            .collect();
        info!(question, count = articles.len(), "found news articles");

        let digest = self.summarize(&articles).await?;
        let draft = compose_draft(question, &digest.text);
        let article = self.model.complete(WRITER_PROMPT, &draft).await?;

        Ok(json!({
            "topic": question,
            "article": article,
            "sources": digest.sources,
        }))
    }

    /// Summarize articles in order until the digest passes [`DIGEST_WORD_LIMIT`].
    async fn summarize(&self, articles: &[NewsArticle]) -> Result<Digest, TaskError> {
        let mut digest = Digest { text: String::new(), sources: Vec::new() };

        for article in articles {
            let Some(text) = article.full_text() else { continue };

            digest.text.push_str(&format!("### {}\n\n", article.title));
            digest.text.push_str(&format!(
                "- Date: {}\n\n",
                article.date.as_deref().unwrap_or("unknown")
            ));
            digest.text.push_str(&format!("- URL: {}\n\n", article.url));
            digest.text.push_str(&format!("#### Introduction\n\n{}\n\n", article.body));

            let mut summary = self.model.complete(SUMMARIZER_PROMPT, text).await?;
            if word_count(&summary) > DIGEST_WORD_LIMIT {
                summary = truncate_words(&summary, DIGEST_WORD_LIMIT);
                info!(title = %article.title, limit = DIGEST_WORD_LIMIT, "truncated article summary");
            }
            digest.text.push_str("#### Summary\n\n");
            digest.text.push_str(&summary);
            digest.text.push_str("\n\n---\n\n");
            digest.sources.push(json!({ "title": article.title, "url": article.url }));

            let words = word_count(&digest.text);
            if words > DIGEST_WORD_LIMIT {
                info!(words, "digest reached word limit; skipping remaining articles");
                break;
            }
        }
        Ok(digest)
    }
}

fn compose_draft(question: &str, digest: &str) -> String {
    let mut draft = format!("# Topic: {question}\n\n");
    if !digest.is_empty() {
        draft.push_str("## Summary of News Articles\n\n");
        draft.push_str(&format!(
            "This section provides a summary of the news articles about {question}.\n\n"
        ));
        draft.push_str("<news_summary>\n\n");
        draft.push_str(digest);
        draft.push_str("\n\n</news_summary>\n\n");
    }
    draft
}
