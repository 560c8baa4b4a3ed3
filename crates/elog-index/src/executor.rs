//! Paginated, newest-first search execution.

use std::sync::Arc;

use tracing::debug;

use crate::codec;
use crate::error::Result;
use crate::query::Query;
use crate::transport::{SearchRequest, SearchTransport, Sort};
use crate::types::{Pagination, SearchResult};

/// Runs queries against an index with offset-based pagination.
///
/// No cursor or scroll state is kept between calls: page `p` of size `s`
/// always skips `p * s` matches.
#[derive(Debug)]
pub struct SearchExecutor<T> {
    transport: Arc<T>,
}

impl<T> Clone for SearchExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: SearchTransport> SearchExecutor<T> {
    /// Creates an executor over the given transport.
    #[must_use]
    pub const fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Executes `query` and returns the requested page, newest first.
    ///
    /// Hits that fail to decode are left out of `content`; the reported
    /// total is always the engine's match count for this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the search request fails. No partial page is
    /// returned in that case.
    pub async fn execute(
        &self,
        index: &str,
        query: &Query,
        pagination: Pagination,
    ) -> Result<SearchResult> {
        let request = SearchRequest {
            query: query.clone(),
            offset: pagination.offset(),
            limit: pagination.size(),
            sort: Sort::newest_first(),
        };

        let hits = self.transport.search(index, &request).await?;
        let returned = hits.hits.len();
        let content: Vec<_> = hits.hits.iter().filter_map(codec::from_document).collect();

        debug!(
            index,
            offset = request.offset,
            limit = request.limit,
            total = hits.total,
            returned,
            dropped = returned - content.len(),
            "search executed"
        );

        Ok(SearchResult {
            content,
            page: pagination.page(),
            size: pagination.size(),
            total_elements: hits.total,
        })
    }
}
