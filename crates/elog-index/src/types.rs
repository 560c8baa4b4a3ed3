//! Core types for log indexing and search.
//!
//! This module provides:
//! - [`LogEntry`] - Caller-facing log entry accepted for ingestion
//! - [`LogDocument`] - Stored representation of a log entry
//! - [`DocumentId`] - Identifier assigned by the search engine
//! - [`TimeRange`] - Inclusive, independently optional time bounds
//! - [`Pagination`] - Clamped zero-based page and page size
//! - [`SearchFilter`] - Optional filters for querying logs
//! - [`SearchResult`] - One page of matching documents plus the total count

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::timestamp_format;

/// Page used when the caller supplies none or a negative one.
pub const DEFAULT_PAGE: u32 = 0;

/// Page size used when the caller supplies none or one out of range.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Identifier the search engine assigned to an indexed document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A structured log entry submitted for ingestion.
///
/// Required fields are assumed validated by the caller; optional fields
/// may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// When the event happened
    pub timestamp: DateTime<Utc>,
    /// Severity level, e.g. `ERROR`
    pub level: String,
    /// Emitting service name
    pub service: String,
    /// The log message
    pub message: String,
    /// Exception or stack trace text
    pub exception: Option<String>,
    /// Distributed trace identifier
    pub trace_id: Option<String>,
    /// Host that produced the entry
    pub host: Option<String>,
}

/// A log entry as stored in the index.
///
/// Serialized field names match the index mapping (`traceId` in camelCase).
/// Absent optional fields are omitted from the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDocument {
    /// When the event happened (ISO-8601 on write; ISO-8601 or epoch millis on read)
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Utc>,
    /// Severity level (keyword)
    pub level: String,
    /// Emitting service (keyword)
    pub service: String,
    /// The log message (full text)
    pub message: String,
    /// Exception text (full text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    /// Trace identifier (keyword)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Host name (keyword)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// Time range for filtering logs. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Earliest matching timestamp
    pub from: Option<DateTime<Utc>>,
    /// Latest matching timestamp
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Creates a new time range with the given bounds.
    #[must_use]
    pub const fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    /// Creates a time range from a start time onwards.
    #[must_use]
    pub const fn since(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// Creates a time range up to and including an end time.
    #[must_use]
    pub const fn until(to: DateTime<Utc>) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// Returns true when neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Checks if a timestamp falls within this range.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        if let Some(from) = self.from {
            if timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if timestamp > to {
                return false;
            }
        }
        true
    }
}

/// Zero-based page number and page size, clamped on construction.
///
/// Deserialization goes through [`Pagination::new`], so decoded values are
/// clamped the same way as caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPagination")]
pub struct Pagination {
    page: u32,
    size: u32,
}

/// Unclamped wire form of [`Pagination`].
#[derive(Deserialize)]
struct RawPagination {
    #[serde(default)]
    page: i64,
    #[serde(default)]
    size: Option<i64>,
}

impl From<RawPagination> for Pagination {
    fn from(raw: RawPagination) -> Self {
        Self::new(raw.page, raw.size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE)))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Creates a pagination from raw caller input.
    ///
    /// A negative page becomes [`DEFAULT_PAGE`]; a size outside
    /// `(0, MAX_PAGE_SIZE]` becomes [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub fn new(page: i64, size: i64) -> Self {
        let page = u32::try_from(page.max(0)).unwrap_or(u32::MAX);
        let size = if size > 0 && size <= i64::from(MAX_PAGE_SIZE) {
            u32::try_from(size).unwrap_or(DEFAULT_PAGE_SIZE)
        } else {
            DEFAULT_PAGE_SIZE
        };
        Self { page, size }
    }

    /// Zero-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of documents per page.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Number of matches skipped before this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }
}

/// Filter criteria for querying logs.
///
/// Every criterion is optional; an absent criterion leaves that dimension
/// unconstrained, so the default filter matches every document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Exact level to match
    pub level: Option<String>,
    /// Exact service to match
    pub service: Option<String>,
    /// Exact trace id to match
    pub trace_id: Option<String>,
    /// Timestamp bounds
    #[serde(default)]
    pub time_range: TimeRange,
    /// Which page to return
    #[serde(default)]
    pub pagination: Pagination,
}

impl SearchFilter {
    /// Creates a new empty filter that matches all logs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to one level.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Restricts results to one service.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Restricts results to one trace.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Adds a time range filter.
    #[must_use]
    pub const fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = time_range;
        self
    }

    /// Selects the page to return.
    #[must_use]
    pub const fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Returns true when no criterion constrains the result set.
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        self.level.is_none()
            && self.service.is_none()
            && self.trace_id.is_none()
            && self.time_range.is_unbounded()
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Matching documents, most recent first
    pub content: Vec<LogDocument>,
    /// Page that was requested
    pub page: u32,
    /// Page size that was requested
    pub size: u32,
    /// Number of documents matching the filter when the query ran
    pub total_elements: u64,
}

impl SearchResult {
    /// Creates an empty result for the given page.
    #[must_use]
    pub const fn empty(pagination: Pagination) -> Self {
        Self {
            content: Vec::new(),
            page: pagination.page(),
            size: pagination.size(),
            total_elements: 0,
        }
    }

    /// Number of pages of `size` needed to hold every match.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    /// Returns true if this page holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
