//! Integration tests for the log HTTP API.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use elog_index::MemoryTransport;
use elog_server::{create_router, AppState, LogServer, ServerConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

// ==================== Helper Functions ====================

const ENDPOINT: &str = "/api/logs";

fn make_state() -> Arc<AppState<MemoryTransport>> {
    Arc::new(AppState::new(
        ServerConfig::in_memory("logs"),
        MemoryTransport::new(),
    ))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn post_json(app: &Router, body: &Value) -> (StatusCode, Value) {
    post_raw(app, body.to_string()).await
}

async fn post_raw(app: &Router, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(ENDPOINT)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, query: &str) -> (StatusCode, Value) {
    let uri = if query.is_empty() {
        ENDPOINT.to_string()
    } else {
        format!("{ENDPOINT}?{query}")
    };
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

fn log_body(timestamp: &str, level: &str, service: &str, message: &str) -> Value {
    json!({
        "timestamp": timestamp,
        "level": level,
        "service": service,
        "message": message,
    })
}

async fn seed(app: &Router) {
    let bodies = [
        log_body("2024-06-01T10:00:00Z", "INFO", "api", "started"),
        log_body("2024-06-01T11:00:00Z", "ERROR", "auth", "bad token"),
        log_body("2024-06-01T12:00:00Z", "WARN", "api", "slow request"),
        log_body("2024-06-01T13:00:00Z", "ERROR", "api", "upstream down"),
    ];
    for body in &bodies {
        let (status, _) = post_json(app, body).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

fn messages(page: &Value) -> Vec<&str> {
    page["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["message"].as_str().unwrap())
        .collect()
}

// ==================== Ingest Tests ====================

#[tokio::test]
async fn test_post_returns_created_with_id() {
    let state = make_state();
    let app = create_router(Arc::clone(&state));

    let mut body = log_body("2024-06-01T12:00:00Z", "ERROR", "auth", "bad token");
    body["traceId"] = json!("4bf92f35");
    body["exception"] = json!("TokenExpired");
    let (status, json) = post_json(&app, &body).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(!json["id"].as_str().unwrap().is_empty());
    assert_eq!(state.store().transport().document_count("logs"), 1);

    let (_, page) = get(&app, "traceId=4bf92f35").await;
    let stored = &page["content"][0];
    assert_eq!(stored["traceId"], "4bf92f35");
    assert_eq!(stored["exception"], "TokenExpired");
    assert_eq!(stored["timestamp"], "2024-06-01T12:00:00Z");
    assert!(stored.get("host").is_none());
}

#[tokio::test]
async fn test_post_missing_fields_is_bad_request() {
    let app = create_router(make_state());

    let (status, json) = post_json(&app, &json!({ "level": "INFO" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_request");
    assert_eq!(
        json["message"],
        "timestamp: timestamp is required; service: service is required; \
         message: message is required"
    );
}

#[tokio::test]
async fn test_post_blank_level_is_bad_request() {
    let app = create_router(make_state());

    let body = log_body("2024-06-01T12:00:00Z", "  ", "auth", "bad token");
    let (status, json) = post_json(&app, &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "level: level is required");
}

#[tokio::test]
async fn test_post_malformed_json_is_bad_request() {
    let state = make_state();
    let app = create_router(Arc::clone(&state));

    let (status, json) = post_raw(&app, "{not json".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_request");
    assert_eq!(state.store().transport().index_count(), 0);
}

#[tokio::test]
async fn test_post_unavailable_engine_is_internal_error() {
    let state = make_state();
    state.store().transport().set_unavailable(true);
    let app = create_router(Arc::clone(&state));

    let body = log_body("2024-06-01T12:00:00Z", "INFO", "api", "hello");
    let (status, json) = post_json(&app, &body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "internal_error");
    assert_eq!(json["message"], "Internal server error");
}

// ==================== Search Tests ====================

#[tokio::test]
async fn test_get_unfiltered_newest_first() {
    let app = create_router(make_state());
    seed(&app).await;

    let (status, page) = get(&app, "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        messages(&page),
        vec!["upstream down", "slow request", "bad token", "started"]
    );
    assert_eq!(page["page"], 0);
    assert_eq!(page["size"], 50);
    assert_eq!(page["totalElements"], 4);
    assert_eq!(page["totalPages"], 1);
}

#[tokio::test]
async fn test_get_filters_by_level_and_service() {
    let app = create_router(make_state());
    seed(&app).await;

    let (_, page) = get(&app, "level=ERROR&service=api").await;
    assert_eq!(messages(&page), vec!["upstream down"]);

    let (_, page) = get(&app, "level=DEBUG").await;
    assert_eq!(page["totalElements"], 0);
    assert!(page["content"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_time_range_inclusive() {
    let app = create_router(make_state());
    seed(&app).await;

    let (_, page) = get(&app, "from=2024-06-01T11:00:00Z&to=2024-06-01T12:00:00Z").await;

    assert_eq!(messages(&page), vec!["slow request", "bad token"]);
}

#[tokio::test]
async fn test_get_blank_params_are_ignored() {
    let app = create_router(make_state());
    seed(&app).await;

    let (status, page) = get(&app, "level=&service=&traceId=&from=&to=&page=&size=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalElements"], 4);
    assert_eq!(page["size"], 50);
}

#[tokio::test]
async fn test_get_unparsable_from_is_ignored() {
    let app = create_router(make_state());
    seed(&app).await;

    let (status, page) = get(&app, "from=last-tuesday").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalElements"], 4);
}

#[tokio::test]
async fn test_get_pagination() {
    let app = create_router(make_state());
    seed(&app).await;

    let (_, page) = get(&app, "page=1&size=3").await;

    assert_eq!(messages(&page), vec!["started"]);
    assert_eq!(page["page"], 1);
    assert_eq!(page["size"], 3);
    assert_eq!(page["totalElements"], 4);
    assert_eq!(page["totalPages"], 2);
}

#[tokio::test]
async fn test_get_out_of_range_pagination_is_clamped() {
    let app = create_router(make_state());
    seed(&app).await;

    let (status, page) = get(&app, "page=-2&size=100000").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 0);
    assert_eq!(page["size"], 50);
    assert_eq!(page["content"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_get_non_integer_page_is_bad_request() {
    let app = create_router(make_state());

    let (status, json) = get(&app, "page=first").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_request");
    assert_eq!(json["message"], "page: must be an integer");
}

#[tokio::test]
async fn test_get_before_any_write_is_empty() {
    let app = create_router(make_state());

    let (status, page) = get(&app, "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalElements"], 0);
    assert_eq!(page["totalPages"], 0);
}

#[tokio::test]
async fn test_get_unavailable_engine_is_internal_error() {
    let state = make_state();
    let app = create_router(Arc::clone(&state));
    seed(&app).await;
    state.store().transport().set_unavailable(true);

    let (status, json) = get(&app, "level=ERROR").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "Internal server error");
}

// ==================== Server Tests ====================

#[tokio::test]
async fn test_server_over_tcp() {
    let server = LogServer::new(ServerConfig::in_memory("logs"), MemoryTransport::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn({
        let server = server.clone();
        async move {
            server
                .serve_on(listener, async {
                    let _ = rx.await;
                })
                .await
        }
    });

    let client = reqwest::Client::new();
    let base = format!("http://{addr}{ENDPOINT}");

    let response = client
        .post(&base)
        .json(&log_body("2024-06-01T12:00:00Z", "INFO", "api", "over the wire"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let page: Value = client
        .get(format!("{base}?service=api"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["content"][0]["message"], "over the wire");

    let health: Value = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
