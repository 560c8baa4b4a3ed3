//! Request and response bodies for the log API.

use chrono::{DateTime, Utc};
use elog_index::codec::timestamp_format;
use elog_index::{
    LogDocument, LogEntry, Pagination, SearchFilter, SearchResult, TimeRange, DEFAULT_PAGE,
    DEFAULT_PAGE_SIZE,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Body of `POST {endpoint}`.
///
/// Every field is optional at the serde level so that missing fields are
/// reported together by [`LogRequest::validate`] instead of failing on the
/// first one.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRequest {
    /// RFC 3339 string or epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<Value>,
    /// Severity label.
    #[serde(default)]
    pub level: Option<String>,
    /// Emitting service.
    #[serde(default)]
    pub service: Option<String>,
    /// Log line.
    #[serde(default)]
    pub message: Option<String>,
    /// Stack trace or error text.
    #[serde(default)]
    pub exception: Option<String>,
    /// Distributed trace id.
    #[serde(default)]
    pub trace_id: Option<String>,
    /// Originating host.
    #[serde(default)]
    pub host: Option<String>,
}

impl LogRequest {
    /// Checks required fields and converts into a [`LogEntry`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] listing every violation as
    /// `field: reason`, joined with `"; "`.
    pub fn validate(self) -> Result<LogEntry, ApiError> {
        let mut violations = Vec::new();

        let timestamp = match self.timestamp.as_ref() {
            None | Some(Value::Null) => {
                violations.push("timestamp: timestamp is required");
                None
            }
            Some(value) => {
                let parsed = timestamp_format::from_json(value);
                if parsed.is_none() {
                    violations
                        .push("timestamp: must be an RFC 3339 instant or epoch milliseconds");
                }
                parsed
            }
        };
        let level = required(self.level, "level: level is required", &mut violations);
        let service = required(self.service, "service: service is required", &mut violations);
        let message = required(self.message, "message: message is required", &mut violations);

        match (timestamp, level, service, message) {
            (Some(timestamp), Some(level), Some(service), Some(message)) => Ok(LogEntry {
                timestamp,
                level,
                service,
                message,
                exception: self.exception,
                trace_id: self.trace_id,
                host: self.host,
            }),
            _ => Err(ApiError::InvalidRequest(violations.join("; "))),
        }
    }
}

fn required(
    value: Option<String>,
    violation: &'static str,
    violations: &mut Vec<&'static str>,
) -> Option<String> {
    let value = value.filter(|v| !v.trim().is_empty());
    if value.is_none() {
        violations.push(violation);
    }
    value
}

/// Query string of `GET {endpoint}`.
///
/// `page` and `size` arrive as text so that a blank value means "use the
/// default" while a non-numeric one is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Exact level.
    pub level: Option<String>,
    /// Exact service.
    pub service: Option<String>,
    /// Exact trace id.
    pub trace_id: Option<String>,
    /// Inclusive lower time bound, RFC 3339.
    pub from: Option<String>,
    /// Inclusive upper time bound, RFC 3339.
    pub to: Option<String>,
    /// Zero-based page number.
    pub page: Option<String>,
    /// Page size.
    pub size: Option<String>,
}

impl SearchParams {
    /// Converts the query string into a [`SearchFilter`].
    ///
    /// Blank values count as absent. A `from` or `to` that does not parse
    /// leaves that bound open.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if `page` or `size` is not an
    /// integer.
    pub fn into_filter(self) -> Result<SearchFilter, ApiError> {
        let page = parse_integer("page", self.page)?.unwrap_or(i64::from(DEFAULT_PAGE));
        let size = parse_integer("size", self.size)?.unwrap_or(i64::from(DEFAULT_PAGE_SIZE));

        let mut filter = SearchFilter::new()
            .with_time_range(TimeRange::new(
                parse_bound(self.from),
                parse_bound(self.to),
            ))
            .with_pagination(Pagination::new(page, size));
        filter.level = non_blank(self.level);
        filter.service = non_blank(self.service);
        filter.trace_id = non_blank(self.trace_id);
        Ok(filter)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_bound(value: Option<String>) -> Option<DateTime<Utc>> {
    non_blank(value)
        .and_then(|v| DateTime::parse_from_rfc3339(v.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_integer(name: &str, value: Option<String>) -> Result<Option<i64>, ApiError> {
    non_blank(value)
        .map(|v| {
            v.trim()
                .parse::<i64>()
                .map_err(|_| ApiError::InvalidRequest(format!("{name}: must be an integer")))
        })
        .transpose()
}

/// One page of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    /// Matching documents, most recent first.
    pub content: Vec<LogDocument>,
    /// Requested page.
    pub page: u32,
    /// Effective page size.
    pub size: u32,
    /// Matches across all pages.
    pub total_elements: u64,
    /// `ceil(total_elements / size)`.
    pub total_pages: u64,
}

impl From<SearchResult> for PageResponse {
    fn from(result: SearchResult) -> Self {
        let total_pages = result.total_pages();
        Self {
            content: result.content,
            page: result.page,
            size: result.size,
            total_elements: result.total_elements,
            total_pages,
        }
    }
}

/// Body returned after a successful ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    /// Engine-assigned document id.
    pub id: String,
}

/// Liveness probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
}
