//! External content providers the task logic calls.
//!
//! Both are opaque collaborators: they may fail or time out, and nothing here
//! retries them.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

pub use http::{HttpNewsSource, OpenAiChatModel, ProviderConfig};

/// One news search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub date: Option<String>,
    /// Short teaser / introduction returned by the search.
    #[serde(default)]
    pub body: String,
    /// Full article text, when the provider could extract it.
    #[serde(default)]
    pub text: Option<String>,
}

impl NewsArticle {
    /// Full text when present and non-blank.
    pub fn full_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<NewsArticle>, TaskError>;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Single-turn completion: `system` sets the role, `prompt` is the user turn.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, TaskError>;
}
