//! HTTP request handlers for the log API.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use elog_index::SearchTransport;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{CreatedResponse, HealthResponse, LogRequest, PageResponse, SearchParams};

/// Handle GET /health - liveness probe.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Handle POST {endpoint} - validate and store one log entry.
///
/// # Errors
///
/// Returns 400 for malformed or incomplete bodies and 500 when the
/// search engine fails.
pub async fn create_log<T: SearchTransport>(
    State(state): State<Arc<AppState<T>>>,
    body: Result<Json<LogRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let Json(request) = body.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected log body");
        ApiError::InvalidRequest(rejection.body_text())
    })?;

    let entry = request.validate().inspect_err(|e| {
        warn!(error = %e, "rejected log entry");
    })?;

    let id = state.store().ingest(entry).await?;
    debug!(id = %id, "log entry stored");

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: id.0 })))
}

/// Handle GET {endpoint} - filtered, paginated search.
///
/// # Errors
///
/// Returns 400 for a non-integer `page` or `size` and 500 when the search
/// engine fails.
pub async fn search_logs<T: SearchTransport>(
    State(state): State<Arc<AppState<T>>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<PageResponse>> {
    let Query(params) =
        params.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    let filter = params.into_filter()?;

    let result = state.store().search(&filter).await?;
    debug!(
        page = result.page,
        size = result.size,
        total = result.total_elements,
        returned = result.content.len(),
        "search completed"
    );

    Ok(Json(PageResponse::from(result)))
}
