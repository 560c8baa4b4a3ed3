//! Shared state for the log server.

use std::sync::Arc;

use elog_index::{LogStore, SearchTransport};

use crate::config::ServerConfig;

/// State shared by every request handler.
#[derive(Debug)]
pub struct AppState<T> {
    store: LogStore<T>,
    config: Arc<ServerConfig>,
}

impl<T: SearchTransport> AppState<T> {
    /// Creates state around a transport, targeting the configured index.
    #[must_use]
    pub fn new(config: ServerConfig, transport: T) -> Self {
        Self::with_store(LogStore::new(transport, config.index_name.as_str()), config)
    }

    /// Creates state around an existing store.
    #[must_use]
    pub fn with_store(store: LogStore<T>, config: ServerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// The log store.
    #[must_use]
    pub const fn store(&self) -> &LogStore<T> {
        &self.store
    }

    /// Server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
