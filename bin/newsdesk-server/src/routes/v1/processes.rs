//! Process endpoints.
//!
//! `POST /v1/processes` accepts work and answers `202` with a process id
//! before anything runs; `GET /v1/processes/{id}` reads the record back.
//! `POST /v1/execute` runs the same task logic in-request and returns the
//! result directly, without creating a record.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use newsdesk_core::ProcessId;
use tracing::info;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::v1::process::{ExecuteResponse, InitiateResponse, ProcessRequest, ProcessResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(initiate_process, poll_process, execute_task),
    components(schemas(ProcessRequest, InitiateResponse, ProcessResponse, ExecuteResponse))
)]
pub struct ProcessesApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/processes", post(initiate_process))
        .route("/processes/{id}", get(poll_process))
        .route("/execute", post(execute_task))
}

#[utoipa::path(
    post,
    path = "/v1/processes",
    tag = "processes",
    request_body = ProcessRequest,
    responses(
        (status = 202, description = "Process accepted", body = InitiateResponse),
        (status = 400, description = "Malformed body or unknown task type"),
        (status = 503, description = "Submission could not be recorded"),
    )
)]
pub async fn initiate_process(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InitiateResponse>), ServerError> {
    let Json(body) = payload?;
    let request = body.into_task_request()?;
    let process_id = state.initiator.initiate(request).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(InitiateResponse { process_id: process_id.to_string() }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/processes/{id}",
    tag = "processes",
    params(
        ("id" = String, Path, description = "Process id returned at submission")
    ),
    responses(
        (status = 200, description = "Current process record", body = ProcessResponse),
        (status = 404, description = "Unknown process id"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn poll_process(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProcessResponse>, ServerError> {
    let record = state.poller.poll(&ProcessId::from(id)).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/v1/execute",
    tag = "processes",
    request_body = ProcessRequest,
    responses(
        (status = 200, description = "Task result", body = ExecuteResponse),
        (status = 400, description = "Malformed body or unknown task type"),
        (status = 422, description = "Invalid task parameters"),
        (status = 502, description = "Provider failure"),
        (status = 504, description = "Execution timed out"),
        (status = 500, description = "Internal error"),
    )
)]
pub async fn execute_task(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ExecuteResponse>, ServerError> {
    let Json(body) = payload?;
    let request = body.into_task_request()?;
    info!(task_type = %request.task_type(), "synchronous execution");
    let result = state.executor.run(&request).await?;
    Ok(Json(ExecuteResponse { result }))
}
