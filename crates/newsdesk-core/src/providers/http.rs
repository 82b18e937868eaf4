//! `reqwest`-backed provider clients.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LanguageModel, NewsArticle, NewsSource};
use crate::error::TaskError;

/// Longest provider error body echoed into a task failure.
const MAX_ERROR_BODY: usize = 300;

/// Shared HTTP client settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Whole-request timeout for every provider call.
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

fn build_client(config: &ProviderConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")))
        .timeout(config.timeout)
        .build()
}

/// Turn a non-2xx response into [`TaskError::Provider`].
async fn check_status(provider: &'static str, resp: Response) -> Result<Response, TaskError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let mut snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
    if body.chars().count() > MAX_ERROR_BODY {
        snippet.push('…');
    }
    Err(TaskError::Provider {
        provider,
        message: format!("HTTP {status}: {snippet}"),
    })
}

// ── News search ───────────────────────────────────────────────────────────────

/// News search API client.
///
/// Issues `GET {base_url}/news?q=<query>&limit=<n>` and expects
/// `{"articles": [{"title", "url", "date", "body", "text"}]}`.
#[derive(Debug, Clone)]
pub struct HttpNewsSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct NewsSearchResponse {
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

impl HttpNewsSource {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        config: &ProviderConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(config)?,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/news", self.base_url)
    }
}

#[async_trait]
impl NewsSource for HttpNewsSource {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<NewsArticle>, TaskError> {
        let limit = max_results.to_string();
        let url = Url::parse_with_params(&self.search_url(), [("q", query), ("limit", limit.as_str())])
            .map_err(|e| TaskError::Provider {
                provider: "news",
                message: format!("invalid search url: {e}"),
            })?;
        let mut req = self.client.get(url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = check_status("news", req.send().await?).await?;
        let mut parsed: NewsSearchResponse = resp.json().await?;
        parsed.articles.truncate(max_results);
        debug!(query, count = parsed.articles.len(), "news search returned");
        Ok(parsed.articles)
    }
}

// ── Chat completion ───────────────────────────────────────────────────────────

/// OpenAI-compatible chat completion client (Groq, OpenAI, local servers).
#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChatModel {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        config: &ProviderConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(config)?,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key,
            model: model.into(),
        })
    }

    fn request_body<'a>(&'a self, system: &'a str, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            stream: false,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, TaskError> {
        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&self.request_body(system, prompt));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = check_status("llm", req.send().await?).await?;
        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| TaskError::Provider {
                provider: "llm",
                message: "completion contained no content".into(),
            })
    }
}
