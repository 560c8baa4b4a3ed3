//! Log server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use elog_index::SearchTransport;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::routes::create_router;
use crate::state::AppState;

/// HTTP server exposing log ingest and search.
#[derive(Debug)]
pub struct LogServer<T> {
    state: Arc<AppState<T>>,
}

impl<T> Clone for LogServer<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: SearchTransport + 'static> LogServer<T> {
    /// Create a server storing logs through `transport`.
    #[must_use]
    pub fn new(config: ServerConfig, transport: T) -> Self {
        Self {
            state: Arc::new(AppState::new(config, transport)),
        }
    }

    /// Get the shared state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState<T>> {
        Arc::clone(&self.state)
    }

    /// Build the router without binding a listener.
    #[must_use]
    pub fn router(&self) -> Router {
        create_router(self.state())
    }

    /// Bind the configured address and serve until a fatal error.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve(&self) -> ApiResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Bind the configured address and serve until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config().bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::BindFailed(addr, e))?;

        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails while running.
    pub async fn serve_on<F>(&self, listener: TcpListener, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listener
            .local_addr()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let config = self.state.config();
        info!(
            addr = %addr,
            path = %config.endpoint_path,
            index = %config.index_name,
            "log server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        info!("log server shut down");
        Ok(())
    }
}
