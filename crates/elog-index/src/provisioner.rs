//! Create-if-absent provisioning of the log index.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{IndexError, Result};
use crate::schema::IndexSchema;
use crate::transport::SearchTransport;

/// Ensures an index exists with the log document mapping.
///
/// Holds no state of its own, so concurrent and repeated calls are safe.
/// Two callers may both see the index as absent and both try to create
/// it; the one that loses gets `AlreadyExists`, which counts as success.
#[derive(Debug)]
pub struct IndexProvisioner<T> {
    transport: Arc<T>,
    schema: IndexSchema,
}

impl<T> Clone for IndexProvisioner<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            schema: self.schema.clone(),
        }
    }
}

impl<T: SearchTransport> IndexProvisioner<T> {
    /// Creates a provisioner for the log document schema.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_schema(transport, IndexSchema::log_documents())
    }

    /// Creates a provisioner for a custom schema.
    #[must_use]
    pub const fn with_schema(transport: Arc<T>, schema: IndexSchema) -> Self {
        Self { transport, schema }
    }

    /// The mapping applied when the index has to be created.
    #[must_use]
    pub const fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    /// Makes sure `index` exists, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the existence check or the creation fails for
    /// any reason other than the index already existing.
    pub async fn ensure_index(&self, index: &str) -> Result<()> {
        if self.transport.index_exists(index).await? {
            debug!(index, "index already exists");
            return Ok(());
        }

        match self.transport.create_index(index, &self.schema).await {
            Ok(()) => {
                info!(index, fields = self.schema.len(), "created index with mappings");
                Ok(())
            }
            Err(IndexError::AlreadyExists(_)) => {
                debug!(index, "index created concurrently");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
