//! # elog-index
//!
//! Log document indexing and query construction over a search engine.
//!
//! This crate provides:
//!
//! - [`LogStore`] - Ingest one entry, search many, against a fixed index
//! - [`IndexProvisioner`] - Idempotent create-if-absent index provisioning
//! - [`query::build`] - Translates a [`SearchFilter`] into a [`Query`]
//! - [`SearchExecutor`] - Offset-paginated, newest-first search
//! - [`codec`] - Conversion between [`LogEntry`] and [`LogDocument`]
//! - [`SearchTransport`] - Abstract search engine operations
//! - [`ElasticsearchTransport`] - REST transport for Elasticsearch
//! - [`MemoryTransport`] - In-process transport for tests and local runs
//!
//! ## Example
//!
//! ```rust
//! use elog_index::{LogEntry, LogStore, MemoryTransport, SearchFilter};
//! use chrono::Utc;
//!
//! # tokio_test::block_on(async {
//! let store = LogStore::new(MemoryTransport::new(), "app-logs");
//!
//! store
//!     .ingest(LogEntry {
//!         timestamp: Utc::now(),
//!         level: "ERROR".to_string(),
//!         service: "auth".to_string(),
//!         message: "bad token".to_string(),
//!         exception: None,
//!         trace_id: None,
//!         host: None,
//!     })
//!     .await?;
//!
//! let page = store.search(&SearchFilter::new().with_level("ERROR")).await?;
//! assert_eq!(page.total_elements, 1);
//! # Ok::<(), elog_index::IndexError>(())
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod elasticsearch;
pub mod error;
pub mod executor;
pub mod memory;
pub mod provisioner;
pub mod query;
pub mod schema;
pub mod store;
pub mod transport;
pub mod types;

// Re-export main types
pub use elasticsearch::ElasticsearchTransport;
pub use error::{IndexError, Result};
pub use executor::SearchExecutor;
pub use memory::MemoryTransport;
pub use provisioner::IndexProvisioner;
pub use query::{Query, SortOrder};
pub use schema::{FieldKind, IndexSchema};
pub use store::LogStore;
pub use transport::{RawHit, SearchHits, SearchRequest, SearchTransport, Sort};
pub use types::{
    DocumentId, LogDocument, LogEntry, Pagination, SearchFilter, SearchResult, TimeRange,
    DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
