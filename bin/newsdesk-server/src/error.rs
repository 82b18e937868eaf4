//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON body
//! `{"error": "..."}` with a matching status code.
//!
//! Store errors are logged with full detail; clients only get a generic
//! message so SQL and file paths never leak.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use newsdesk_core::{InitiateError, PollError, StoreError, TaskError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The submission could not be persisted; no process was created.
    #[error(transparent)]
    Submission(InitiateError),

    /// Synchronous task execution failed.
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Submission(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Task(e) => match e {
                TaskError::InvalidParameters(_) => StatusCode::UNPROCESSABLE_ENTITY,
                TaskError::Provider { .. } | TaskError::Http(_) | TaskError::NoContent(_) => {
                    StatusCode::BAD_GATEWAY
                }
                TaskError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                TaskError::Panicked(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let client_message = match &self {
            ServerError::BadRequest(m) | ServerError::NotFound(m) => m.clone(),
            ServerError::Submission(e) => {
                error!(error = %e, "submission rejected");
                "could not accept the submission; try again later".to_owned()
            }
            ServerError::Task(TaskError::Panicked(m)) => {
                error!(panic = %m, "synchronous task panicked");
                "internal server error".to_owned()
            }
            ServerError::Task(e) => {
                warn!(error = %e, "synchronous task failed");
                e.to_string()
            }
            ServerError::Store(e) => {
                error!(error = %e, "store error");
                "internal server error".to_owned()
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<InitiateError> for ServerError {
    fn from(e: InitiateError) -> Self {
        ServerError::Submission(e)
    }
}

impl From<PollError> for ServerError {
    fn from(e: PollError) -> Self {
        match e {
            PollError::NotFound(id) => ServerError::NotFound(format!("process {id} not found")),
            PollError::Store(e) => ServerError::Store(e),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(e: JsonRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}
