//! In-process search transport.
//!
//! [`MemoryTransport`] keeps indices and their documents in memory and
//! evaluates [`Query`](crate::Query) expressions directly against the stored
//! JSON sources. It follows the engine contract the core relies on:
//! - `create_index` on an existing index fails with `AlreadyExists`
//! - writes to a missing index fail with a 404 engine error
//! - searching a missing index yields no hits
//! - hits are sorted on the requested field, ties in insertion order
//!
//! Failure switches let tests simulate an unreachable engine and the
//! check-then-create race.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{IndexError, Result};
use crate::query::{read_instant, SortOrder};
use crate::schema::IndexSchema;
use crate::transport::{RawHit, SearchHits, SearchRequest, SearchTransport};
use crate::types::DocumentId;

/// One stored document.
#[derive(Debug, Clone)]
struct StoredDocument {
    id: String,
    source: Value,
}

/// One index: its mapping and documents in insertion order.
#[derive(Debug, Clone)]
struct MemoryIndex {
    schema: IndexSchema,
    documents: Vec<StoredDocument>,
}

/// Thread-safe in-memory search engine.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    indices: RwLock<HashMap<String, MemoryIndex>>,
    unavailable: AtomicBool,
    stale_existence: AtomicBool,
    create_calls: AtomicUsize,
}

impl MemoryTransport {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail with a connectivity error while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes existence checks report every index as absent while set.
    ///
    /// This reproduces what the loser of a concurrent provisioning race
    /// observes: the index looked missing, then creation finds it present.
    pub fn set_stale_existence(&self, stale: bool) {
        self.stale_existence.store(stale, Ordering::SeqCst);
    }

    /// Number of `create_index` calls received, successful or not.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of existing indices.
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indices.read().len()
    }

    /// Mapping an index was created with.
    #[must_use]
    pub fn schema_of(&self, index: &str) -> Option<IndexSchema> {
        self.indices.read().get(index).map(|i| i.schema.clone())
    }

    /// Number of documents in an index (0 if it does not exist).
    #[must_use]
    pub fn document_count(&self, index: &str) -> usize {
        self.indices
            .read()
            .get(index)
            .map_or(0, |i| i.documents.len())
    }

    /// Deletes an index and its documents. Returns true if it existed.
    pub fn delete_index(&self, index: &str) -> bool {
        self.indices.write().remove(index).is_some()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IndexError::Connectivity(
                "in-memory engine marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl SearchTransport for MemoryTransport {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        self.check_available()?;
        if self.stale_existence.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.indices.read().contains_key(index))
    }

    async fn create_index(&self, index: &str, schema: &IndexSchema) -> Result<()> {
        self.check_available()?;
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let mut indices = self.indices.write();
        if indices.contains_key(index) {
            return Err(IndexError::AlreadyExists(index.to_string()));
        }
        indices.insert(
            index.to_string(),
            MemoryIndex {
                schema: schema.clone(),
                documents: Vec::new(),
            },
        );
        drop(indices);

        debug!(index, "in-memory index created");
        Ok(())
    }

    async fn index_document(&self, index: &str, source: &Value) -> Result<DocumentId> {
        self.check_available()?;

        let mut indices = self.indices.write();
        let Some(target) = indices.get_mut(index) else {
            return Err(IndexError::Engine {
                status: 404,
                reason: format!("index_not_found_exception: {index}"),
            });
        };

        let id = Uuid::new_v4().simple().to_string();
        target.documents.push(StoredDocument {
            id: id.clone(),
            source: source.clone(),
        });
        Ok(DocumentId(id))
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchHits> {
        self.check_available()?;

        let indices = self.indices.read();
        let Some(target) = indices.get(index) else {
            return Ok(SearchHits::default());
        };

        let mut matching: Vec<&StoredDocument> = target
            .documents
            .iter()
            .filter(|doc| request.query.matches(&doc.source))
            .collect();

        // Stable sort keeps insertion order among equal keys.
        let field = request.sort.field;
        let order = request.sort.order;
        matching.sort_by(|a, b| {
            let ka = a.source.get(field).and_then(read_instant);
            let kb = b.source.get(field).and_then(read_instant);
            match (ka, kb) {
                (Some(x), Some(y)) => match order {
                    SortOrder::Asc => x.cmp(&y),
                    SortOrder::Desc => y.cmp(&x),
                },
                // Documents without a sortable value go last either way.
                (Some(_), None) => CmpOrdering::Less,
                (None, Some(_)) => CmpOrdering::Greater,
                (None, None) => CmpOrdering::Equal,
            }
        });

        let total = matching.len() as u64;
        let offset = usize::try_from(request.offset).unwrap_or(usize::MAX);
        let hits = matching
            .into_iter()
            .skip(offset)
            .take(request.limit as usize)
            .map(|doc| RawHit {
                id: Some(doc.id.clone()),
                source: Some(doc.source.clone()),
            })
            .collect();

        Ok(SearchHits { total, hits })
    }
}
