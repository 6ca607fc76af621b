//! Integration tests for the tool router HTTP API.
//!
//! These tests drive the axum handlers directly against an in-memory gateway,
//! so they need no network access.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tool_router::{
    gateway::GatewayResult,
    handlers::{execute_handler, health_handler, list_tools_handler, ready_handler, search_handler},
    AppState, GatewayError, TaskExecutor, ToolCatalog, ToolDescriptor, ToolGateway, ToolMatcher,
};
use tower::ServiceExt;

/// In-memory gateway that answers from a fixed tool list.
struct StaticGateway {
    tools: Vec<ToolDescriptor>,
    fail_listing: bool,
}

impl StaticGateway {
    fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            tools,
            fail_listing: false,
        }
    }

    fn unreachable() -> Self {
        Self {
            fail_listing: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl ToolGateway for StaticGateway {
    async fn get_tools(&self) -> GatewayResult<Vec<ToolDescriptor>> {
        if self.fail_listing {
            return Err(GatewayError::Unavailable {
                operation: "get_tools",
                attempts: 4,
                last_error: "connection failed".into(),
            });
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: &Value) -> GatewayResult<String> {
        Ok(format!("{} ran with {}", name, arguments))
    }
}

fn sample_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "github__create_issue",
            "Create a new issue in a GitHub repository",
            json!({
                "type": "object",
                "properties": {"title": {"type": "string"}, "repo": {"type": "string"}},
                "required": ["title"]
            }),
        ),
        ToolDescriptor::new(
            "weather__get_forecast",
            "Get the weather forecast for a city",
            json!({
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }),
        ),
        ToolDescriptor::new(
            "search__web_search",
            "Search the web for pages matching a query",
            json!({
                "type": "object",
                "properties": {"query": {"type": "string"}}
            }),
        ),
    ]
}

fn state_with(gateway: StaticGateway) -> Arc<AppState> {
    let catalog = Arc::new(ToolCatalog::new(Arc::new(gateway), Duration::from_secs(60)));
    Arc::new(AppState::with_executor(TaskExecutor::new(
        catalog,
        ToolMatcher::default(),
    )))
}

/// Helper to create a test router with every endpoint.
fn create_test_app(state: Arc<AppState>) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/execute", post(execute_handler))
        .route("/search", post(search_handler))
        .route("/tools", get(list_tools_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}

/// Helper to make a JSON request to the router.
async fn json_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let req = match method {
        "GET" => Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
        "POST" => Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.unwrap_or(json!({})).to_string()))
            .unwrap(),
        _ => panic!("Unsupported method"),
    };

    let response = app.oneshot(req).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, body)
}

// ============================================================================
// Health Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_200() {
    use axum::routing::get;

    let app = Router::new().route("/health", get(health_handler));
    let (status, body) = json_request(app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "tool-router");
}

#[tokio::test]
async fn test_ready_before_and_after_warmup() {
    let state = state_with(StaticGateway::new(sample_tools()));

    let (status, body) = json_request(create_test_app(state.clone()), "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not_ready");

    state.warmup().await;

    let (status, body) = json_request(create_test_app(state), "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_failed_warmup_stays_not_ready() {
    let state = state_with(StaticGateway::unreachable());
    state.warmup().await;

    let (status, _) = json_request(create_test_app(state), "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// Tool Listing Tests
// ============================================================================

#[tokio::test]
async fn test_list_tools_reports_gateway_slugs() {
    let app = create_test_app(state_with(StaticGateway::new(sample_tools())));

    let (status, body) = json_request(app, "GET", "/tools", None).await;

    assert_eq!(status, StatusCode::OK);
    let tools = body.as_array().unwrap();
    assert_eq!(tools.len(), 3);
    assert_eq!(tools[0]["name"], "github__create_issue");
    assert_eq!(tools[0]["gateway"], "github");
    assert!(tools[0].get("input_schema").is_none());
}

#[tokio::test]
async fn test_list_tools_gateway_down_returns_503() {
    let app = create_test_app(state_with(StaticGateway::unreachable()));

    let (status, body) = json_request(app, "GET", "/tools", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], 503);
    assert!(body["error"].as_str().unwrap().contains("get_tools"));
}

// ============================================================================
// Search Tests
// ============================================================================

#[tokio::test]
async fn test_search_ranks_matching_tool_first() {
    let app = create_test_app(state_with(StaticGateway::new(sample_tools())));

    let (status, body) = json_request(
        app,
        "POST",
        "/search",
        Some(json!({"query": "what is the weather forecast in Paris"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0]["name"], "weather__get_forecast");
    assert!(results[0]["score"].as_f64().unwrap() > 0.0);
    assert!(results[0]["breakdown"].is_object());
}

#[tokio::test]
async fn test_search_respects_top_k() {
    let app = create_test_app(state_with(StaticGateway::new(sample_tools())));

    let (status, body) = json_request(
        app,
        "POST",
        "/search",
        Some(json!({"query": "create issue search weather", "top_k": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_empty_query_returns_400() {
    let app = create_test_app(state_with(StaticGateway::new(sample_tools())));

    let (status, response) =
        json_request(app, "POST", "/search", Some(json!({"query": "   "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_search_zero_top_k_returns_400() {
    let app = create_test_app(state_with(StaticGateway::new(sample_tools())));

    let (status, _) = json_request(
        app,
        "POST",
        "/search",
        Some(json!({"query": "weather", "top_k": 0})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Execute Tests
// ============================================================================

#[tokio::test]
async fn test_execute_invokes_best_tool() {
    let app = create_test_app(state_with(StaticGateway::new(sample_tools())));

    let (status, body) = json_request(
        app,
        "POST",
        "/execute",
        Some(json!({"task": "create a github issue about the login bug"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tool"]["name"], "github__create_issue");
    assert_eq!(
        body["arguments"]["title"],
        "create a github issue about the login bug"
    );
    assert!(body["result"].as_str().unwrap().starts_with("github__create_issue ran"));
    assert_eq!(body["candidates"].as_array().unwrap().len(), 1);
    assert!(body["execution_id"].is_string());
}

#[tokio::test]
async fn test_execute_no_matching_tool_returns_404() {
    let app = create_test_app(state_with(StaticGateway::new(sample_tools())));

    let (status, body) = json_request(
        app,
        "POST",
        "/execute",
        Some(json!({"task": "xylophone zebra quantum"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_execute_with_empty_tool_list_returns_404() {
    let app = create_test_app(state_with(StaticGateway::new(Vec::new())));

    let (status, _) = json_request(
        app,
        "POST",
        "/execute",
        Some(json!({"task": "create a github issue"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_execute_empty_task_returns_400() {
    let app = create_test_app(state_with(StaticGateway::new(sample_tools())));

    let (status, response) =
        json_request(app, "POST", "/execute", Some(json!({"task": ""}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_execute_gateway_down_returns_503() {
    let app = create_test_app(state_with(StaticGateway::unreachable()));

    let (status, _) = json_request(
        app,
        "POST",
        "/execute",
        Some(json!({"task": "create a github issue"})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_execute_missing_task_field_is_rejected() {
    let app = create_test_app(state_with(StaticGateway::new(sample_tools())));

    let (status, _) = json_request(app, "POST", "/execute", Some(json!({"top_n": 2}))).await;

    assert!(status.is_client_error());
}
