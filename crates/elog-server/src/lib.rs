//! # elog-server
//!
//! HTTP front end for structured log ingest and search.
//!
//! Built on axum, this crate validates incoming log entries, hands them to
//! an [`elog_index::LogStore`], and serves filtered, paginated searches.
//!
//! ## Example
//!
//! ```rust,no_run
//! use elog_index::MemoryTransport;
//! use elog_server::{LogServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::in_memory("app-logs");
//!     let server = LogServer::new(config, MemoryTransport::new());
//!     // server.serve().await.unwrap();
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `{endpoint}` | POST | Store one log entry, `201` with the document id |
//! | `{endpoint}` | GET | Search by `level`, `service`, `traceId`, `from`, `to`, `page`, `size` |
//! | `/health` | GET | Liveness probe |
//!
//! `{endpoint}` defaults to `/api/logs`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod types;

// Re-export main types
pub use config::{Args, Backend, ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::LogServer;
pub use state::AppState;
