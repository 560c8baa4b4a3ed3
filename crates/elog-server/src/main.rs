//! elogger - structured log ingest and search service.
//!
//! Accepts log entries over HTTP and stores them in an Elasticsearch index
//! so they can be searched through the same endpoint or through Kibana.

use anyhow::Context;
use clap::Parser;
use elog_index::{ElasticsearchTransport, MemoryTransport};
use elog_server::{Args, Backend, LogServer, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse()
        .into_config()
        .context("invalid configuration")?;

    info!(index = %config.index_name, "log index configured");
    if let Some(kibana) = &config.kibana_url {
        info!(url = %kibana, "logs are browsable in Kibana");
    }

    match config.backend.clone() {
        Backend::Elasticsearch(url) => {
            info!(url = %url, "using Elasticsearch");
            let transport = ElasticsearchTransport::with_timeout(url, config.request_timeout)
                .context("failed to create Elasticsearch client")?;
            run(config, transport).await
        }
        Backend::InMemory => {
            warn!("using the in-memory store; logs are lost on exit");
            run(config, MemoryTransport::new()).await
        }
    }
}

async fn run<T: elog_index::SearchTransport + 'static>(
    config: ServerConfig,
    transport: T,
) -> anyhow::Result<()> {
    let server = LogServer::new(config, transport);
    server
        .serve_with_shutdown(shutdown_signal())
        .await
        .context("server failed")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
