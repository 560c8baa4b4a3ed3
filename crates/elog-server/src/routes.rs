//! Route configuration for the log API.

use std::sync::Arc;

use axum::routing::{get, Router};
use elog_index::SearchTransport;
use tower_http::trace::TraceLayer;

use crate::config::HEALTH_PATH;
use crate::handlers::{create_log, health_check, search_logs};
use crate::state::AppState;

/// Create the log API router.
///
/// The ingest and search endpoints share the configured path; `/health`
/// is always mounted at the root.
pub fn create_router<T: SearchTransport + 'static>(state: Arc<AppState<T>>) -> Router {
    let endpoint = state.config().endpoint_path.clone();

    Router::new()
        .route(HEALTH_PATH, get(health_check))
        .route(&endpoint, get(search_logs::<T>).post(create_log::<T>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use elog_index::MemoryTransport;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::ServerConfig;

    fn make_test_state(path: &str) -> Arc<AppState<MemoryTransport>> {
        let config = ServerConfig::in_memory("logs").with_endpoint_path(path);
        Arc::new(AppState::new(config, MemoryTransport::new()))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(make_test_state("/api/logs"));

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_custom_endpoint_path() {
        let app = create_router(make_test_state("/v1/entries"));

        let request = Request::builder()
            .uri("/v1/entries")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .uri("/api/logs")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let app = create_router(make_test_state("/api/logs"));

        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/api/logs")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_post_then_get() {
        let state = make_test_state("/api/logs");
        let app = create_router(Arc::clone(&state));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/logs")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"timestamp":"2024-06-01T12:00:00Z","level":"ERROR","service":"auth","message":"bad token"}"#,
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(state.store().transport().document_count("logs"), 1);

        let request = Request::builder()
            .uri("/api/logs?level=ERROR")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["totalElements"], 1);
        assert_eq!(json["content"][0]["message"], "bad token");
    }
}
