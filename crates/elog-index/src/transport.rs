//! The search engine capability the core is written against.
//!
//! [`SearchTransport`] is the only seam between the core and the search
//! engine. [`ElasticsearchTransport`](crate::ElasticsearchTransport) speaks
//! the Elasticsearch REST API; [`MemoryTransport`](crate::MemoryTransport)
//! keeps documents in process for tests and cluster-less runs.

use std::future::Future;

use serde_json::Value;

use crate::error::Result;
use crate::query::{Query, SortOrder};
use crate::schema::{IndexSchema, TIMESTAMP_FIELD};
use crate::types::DocumentId;

/// A single search issued against one index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Which documents match
    pub query: Query,
    /// Matches to skip
    pub offset: u64,
    /// Maximum hits to return
    pub limit: u32,
    /// Sort key and direction
    pub sort: Sort,
}

/// Sort specification for a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Field to sort on
    pub field: &'static str,
    /// Direction
    pub order: SortOrder,
}

impl Sort {
    /// Most recent documents first.
    #[must_use]
    pub const fn newest_first() -> Self {
        Self {
            field: TIMESTAMP_FIELD,
            order: SortOrder::Desc,
        }
    }
}

/// A hit as returned by the engine, before decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    /// Engine-assigned document id, when reported
    pub id: Option<String>,
    /// Stored source record, when returned
    pub source: Option<Value>,
}

/// Hits for one search plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    /// Total documents matching the query, independent of offset and limit
    pub total: u64,
    /// The requested window of hits, in sort order
    pub hits: Vec<RawHit>,
}

/// Abstract search engine operations used by the core.
///
/// Every method is awaited to completion by its caller; implementations
/// must not retry internally.
pub trait SearchTransport: Send + Sync {
    /// Checks whether an index exists.
    fn index_exists(&self, index: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Creates an index with the given mapping.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::AlreadyExists`](crate::IndexError::AlreadyExists)
    /// when the index is already present.
    fn create_index(
        &self,
        index: &str,
        schema: &IndexSchema,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Stores one document and returns its generated id.
    fn index_document(
        &self,
        index: &str,
        source: &Value,
    ) -> impl Future<Output = Result<DocumentId>> + Send;

    /// Runs a search and returns the requested window of hits.
    fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<SearchHits>> + Send;
}
