//! The log store: single entry point for ingesting and searching logs.

use std::sync::Arc;

use tracing::debug;

use crate::codec;
use crate::error::Result;
use crate::executor::SearchExecutor;
use crate::provisioner::IndexProvisioner;
use crate::query;
use crate::transport::SearchTransport;
use crate::types::{DocumentId, LogEntry, SearchFilter, SearchResult};

/// Ingests and searches log documents in one fixed index.
///
/// The index name is the only state, fixed at construction. Clones share
/// the transport.
#[derive(Debug)]
pub struct LogStore<T> {
    index: Arc<str>,
    transport: Arc<T>,
    provisioner: IndexProvisioner<T>,
    executor: SearchExecutor<T>,
}

impl<T> Clone for LogStore<T> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            transport: Arc::clone(&self.transport),
            provisioner: self.provisioner.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<T: SearchTransport> LogStore<T> {
    /// Creates a store writing to and reading from `index`.
    #[must_use]
    pub fn new(transport: T, index: impl Into<String>) -> Self {
        Self::shared(Arc::new(transport), index)
    }

    /// Creates a store over an already shared transport.
    #[must_use]
    pub fn shared(transport: Arc<T>, index: impl Into<String>) -> Self {
        Self {
            index: Arc::from(index.into()),
            provisioner: IndexProvisioner::new(Arc::clone(&transport)),
            executor: SearchExecutor::new(Arc::clone(&transport)),
            transport,
        }
    }

    /// Name of the target index.
    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Makes sure the target index exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be checked or created.
    pub async fn ensure_index(&self) -> Result<()> {
        self.provisioner.ensure_index(&self.index).await
    }

    /// Stores one log entry and returns the generated document id.
    ///
    /// The index is provisioned on every call, so an index deleted
    /// externally between calls is recreated.
    ///
    /// # Errors
    ///
    /// Returns an error if provisioning or the write fails. The write is
    /// not attempted when provisioning fails.
    pub async fn ingest(&self, entry: LogEntry) -> Result<DocumentId> {
        let document = codec::to_document(entry);
        let source = codec::to_source(&document)?;

        self.ensure_index().await?;
        let id = self.transport.index_document(&self.index, &source).await?;

        debug!(
            index = %self.index,
            id = %id,
            service = %document.service,
            level = %document.level,
            "indexed log document"
        );
        Ok(id)
    }

    /// Returns one page of documents matching `filter`, newest first.
    ///
    /// Does not provision the index; a missing index yields whatever the
    /// search engine reports for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the search request fails.
    pub async fn search(&self, filter: &SearchFilter) -> Result<SearchResult> {
        let query = query::build(filter);
        self.executor
            .execute(&self.index, &query, filter.pagination)
            .await
    }
}
