//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID span)
//! - Optional Swagger UI / OpenAPI document (disable with `NEWSDESK_ENABLE_SWAGGER=false`)
//! - Health / heartbeat route
//! - `/v1` process routes

pub mod doc;
mod health;
mod v1;

use std::sync::Arc;

use axum::{Router, middleware};
use tower::ServiceBuilder;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(health::router())
        .nest("/v1", v1::router());

    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(
            state.config.cors_allowed_origins.as_deref(),
        )))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use newsdesk_core::{
        AnyStore, Executor, MemoryStore, PoolConfig, TaskError, TaskRequest, TaskRunner, Worker,
        WorkerPool,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;

    struct EchoRunner;

    #[async_trait]
    impl TaskRunner for EchoRunner {
        async fn run(&self, request: &TaskRequest) -> Result<Value, TaskError> {
            match request {
                TaskRequest::NewsArticle(p) if p.question.trim().is_empty() => {
                    Err(TaskError::InvalidParameters("question must not be blank".into()))
                }
                TaskRequest::NewsArticle(p) if p.question == "fail" => {
                    Err(TaskError::Provider { provider: "llm", message: "HTTP 503".into() })
                }
                TaskRequest::NewsArticle(p) => Ok(json!({ "article": p.question })),
                TaskRequest::MarketSummary(p) => Ok(json!({ "summary": p.topic })),
            }
        }
    }

    fn app_with(config: Config) -> Router {
        let store = Arc::new(AnyStore::Memory(MemoryStore::new()));
        let executor = Executor::new(Arc::new(EchoRunner), Duration::from_secs(5));
        let worker = Arc::new(Worker::new(Arc::clone(&store), executor.clone()));
        let (dispatcher, _pool) = WorkerPool::start(worker, PoolConfig::default());
        build(Arc::new(AppState::new(Arc::new(config), store, dispatcher, executor)))
    }

    fn app() -> Router {
        app_with(Config::default())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn submit_then_poll_until_completed() {
        let app = app();
        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/processes",
                json!({ "taskType": "market-summary", "parameters": { "topic": "cocoa" } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let process_id = json_body(response).await["processId"].as_str().unwrap().to_owned();

        let mut last = Value::Null;
        for _ in 0..200 {
            let response = app
                .clone()
                .oneshot(Request::get(format!("/v1/processes/{process_id}")).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            last = json_body(response).await;
            if last["status"] == "COMPLETED" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(last["status"], "COMPLETED");
        assert_eq!(last["processId"], process_id.as_str());
        assert_eq!(last["taskType"], "market-summary");
        assert_eq!(last["result"], json!({ "summary": "cocoa" }));
        assert!(last.get("errorDetail").is_none());
        assert!(last["createdAt"].is_string() && last["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn failed_process_reports_error_detail() {
        let app = app();
        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/processes",
                json!({ "taskType": "news-article", "parameters": { "question": "fail" } }),
            ))
            .await
            .unwrap();
        let process_id = json_body(response).await["processId"].as_str().unwrap().to_owned();

        let mut last = Value::Null;
        for _ in 0..200 {
            let response = app
                .clone()
                .oneshot(Request::get(format!("/v1/processes/{process_id}")).body(Body::empty()).unwrap())
                .await
                .unwrap();
            last = json_body(response).await;
            if last["status"] == "FAILED" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(last["status"], "FAILED");
        assert_eq!(last["errorDetail"], "llm provider error: HTTP 503");
        assert!(last.get("result").is_none());
    }

    #[tokio::test]
    async fn unknown_task_type_is_rejected_before_any_record() {
        let response = app()
            .oneshot(post_json("/v1/processes", json!({ "taskType": "horoscope", "parameters": {} })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "unknown task type 'horoscope'");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let request = Request::post("/v1/processes")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_process_is_404() {
        let response = app()
            .oneshot(Request::get("/v1/processes/does-not-exist").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "process does-not-exist not found");
    }

    #[tokio::test]
    async fn execute_returns_result_inline() {
        let response = app()
            .oneshot(post_json(
                "/v1/execute",
                json!({ "taskType": "news-article", "parameters": { "question": "tides" } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "result": { "article": "tides" } }));
    }

    #[tokio::test]
    async fn execute_maps_task_errors_to_status_codes() {
        let app = app();
        let invalid = app
            .clone()
            .oneshot(post_json(
                "/v1/execute",
                json!({ "taskType": "news-article", "parameters": { "question": " " } }),
            ))
            .await
            .unwrap();
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let provider = app
            .oneshot(post_json(
                "/v1/execute",
                json!({ "taskType": "news-article", "parameters": { "question": "fail" } }),
            ))
            .await
            .unwrap();
        assert_eq!(provider.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(provider).await["error"], "llm provider error: HTTP 503");
    }

    #[tokio::test]
    async fn trace_id_is_echoed() {
        let trace_id = "6a1f8a34-5bcb-4d3b-9d0e-1b2f3c4d5e6f";
        let response = app()
            .oneshot(
                Request::get("/health")
                    .header(trace::X_TRACE_ID, trace_id)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[trace::X_TRACE_ID], trace_id);
    }

    #[tokio::test]
    async fn swagger_can_be_disabled() {
        let enabled = app()
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(enabled.status(), StatusCode::OK);
        let doc = json_body(enabled).await;
        assert!(doc["paths"]["/v1/processes"].is_object());

        let disabled = app_with(Config { enable_swagger: false, ..Config::default() })
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(disabled.status(), StatusCode::NOT_FOUND);
    }
}
