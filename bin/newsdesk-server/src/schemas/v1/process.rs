use newsdesk_core::{ProcessRecord, TaskRequest, TaskType};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::error::ServerError;

/// Body of `POST /v1/processes` and `POST /v1/execute`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    /// `news-article` or `market-summary`.
    #[schema(example = "market-summary")]
    pub task_type: String,
    /// Task-specific parameters, e.g. `{"question": "..."}` or
    /// `{"topic": "...", "maxArticles": 5}`.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub parameters: Value,
}

impl ProcessRequest {
    /// Resolve the task type and decode its parameters.
    pub fn into_task_request(self) -> Result<TaskRequest, ServerError> {
        let task_type: TaskType = self
            .task_type
            .parse()
            .map_err(|_| ServerError::BadRequest(format!("unknown task type '{}'", self.task_type)))?;
        serde_json::from_value(json!({
            "taskType": task_type,
            "parameters": self.parameters,
        }))
        .map_err(|e| ServerError::BadRequest(format!("invalid parameters for {task_type}: {e}")))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    pub process_id: String,
}

/// Snapshot of a process record.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub process_id: String,
    pub task_type: String,
    /// `PENDING`, `PROCESSING`, `COMPLETED` or `FAILED`.
    pub status: String,
    #[schema(value_type = Object)]
    pub parameters: Value,
    /// Present only when `status` is `COMPLETED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub result: Option<Value>,
    /// Present only when `status` is `FAILED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProcessRecord> for ProcessResponse {
    fn from(r: ProcessRecord) -> Self {
        Self {
            process_id: r.process_id.to_string(),
            task_type: r.task_type.to_string(),
            status: r.status.to_string(),
            parameters: r.parameters,
            result: r.result,
            error_detail: r.error_detail,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExecuteResponse {
    #[schema(value_type = Object)]
    pub result: Value,
}
