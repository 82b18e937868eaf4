use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::error::StoreError;

/// Opaque identifier handed to the client at submission time.
///
/// Generated from a random UUID v4 (122 bits of entropy), never from a counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(String);

impl ProcessId {
    /// Mint a fresh, globally unique identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProcessId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProcessId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Lifecycle state of a [`ProcessRecord`].
///
/// Transitions only move forward: `PENDING → PROCESSING → {COMPLETED, FAILED}`.
/// `PENDING` may also jump straight to a terminal state (dispatch failure,
/// reaped record, or a worker that skips the pick-up write).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessStatus {
    pub const NON_TERMINAL: [ProcessStatus; 2] = [ProcessStatus::Pending, ProcessStatus::Processing];

    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessStatus::Completed | ProcessStatus::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: ProcessStatus) -> bool {
        use ProcessStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Completed) | (Pending, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }

    /// States from which `self` can be entered.
    pub fn predecessors(self) -> &'static [ProcessStatus] {
        use ProcessStatus::*;
        match self {
            Pending => &[],
            Processing => &[Pending],
            Completed | Failed => &[Pending, Processing],
        }
    }
}

/// The category of work a process runs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TaskType {
    /// Research recent news on a question and write a long-form article.
    NewsArticle,
    /// Summarize recent news coverage of a market topic.
    MarketSummary,
}

/// Parameters for [`TaskType::NewsArticle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticleParams {
    pub question: String,
}

/// Parameters for [`TaskType::MarketSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummaryParams {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_articles: Option<u8>,
}

/// A submitted unit of work, tagged by task type.
///
/// Serialized as `{"taskType": "...", "parameters": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "taskType", content = "parameters", rename_all = "kebab-case")]
pub enum TaskRequest {
    NewsArticle(NewsArticleParams),
    MarketSummary(MarketSummaryParams),
}

impl TaskRequest {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskRequest::NewsArticle(_) => TaskType::NewsArticle,
            TaskRequest::MarketSummary(_) => TaskType::MarketSummary,
        }
    }

    /// The parameters alone, as stored on the record.
    pub fn parameters(&self) -> Result<Value, serde_json::Error> {
        match self {
            TaskRequest::NewsArticle(p) => serde_json::to_value(p),
            TaskRequest::MarketSummary(p) => serde_json::to_value(p),
        }
    }
}

/// A single state transition applied to an existing record.
///
/// Terminal variants carry their payload, so `result` and `error_detail` can
/// only ever be attached together with the matching status.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Processing,
    Completed(Value),
    Failed(String),
}

impl StatusUpdate {
    pub fn status(&self) -> ProcessStatus {
        match self {
            StatusUpdate::Processing => ProcessStatus::Processing,
            StatusUpdate::Completed(_) => ProcessStatus::Completed,
            StatusUpdate::Failed(_) => ProcessStatus::Failed,
        }
    }
}

/// The single persisted entity, one per [`ProcessId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub process_id: ProcessId,
    pub task_type: TaskType,
    /// Parameters as submitted; kept for diagnostics.
    pub parameters: Value,
    pub status: ProcessStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl ProcessRecord {
    /// A freshly submitted record in the `PENDING` state.
    pub fn pending(
        process_id: ProcessId,
        request: &TaskRequest,
        now: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            process_id,
            task_type: request.task_type(),
            parameters: request.parameters()?,
            status: ProcessStatus::Pending,
            created_at: now,
            updated_at: now,
            result: None,
            error_detail: None,
        })
    }

    /// Apply `update` in place, refusing any transition the state machine
    /// does not allow.
    pub fn apply(&mut self, update: StatusUpdate, at: DateTime<Utc>) -> Result<(), StoreError> {
        let next = update.status();
        if !self.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                process_id: self.process_id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = at;
        match update {
            StatusUpdate::Processing => {}
            StatusUpdate::Completed(result) => self.result = Some(result),
            StatusUpdate::Failed(detail) => self.error_detail = Some(detail),
        }
        Ok(())
    }
}
