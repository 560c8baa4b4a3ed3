//! Elasticsearch transport over the REST API.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | index exists | `HEAD /{index}` |
//! | create index | `PUT /{index}` with `{"mappings": ...}` |
//! | index document | `POST /{index}/_doc` |
//! | search | `POST /{index}/_search` |

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use crate::error::{IndexError, Result};
use crate::schema::IndexSchema;
use crate::transport::{RawHit, SearchHits, SearchRequest, SearchTransport};
use crate::types::DocumentId;

/// Default timeout applied to every request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type Elasticsearch reports when creating an index that exists.
const ALREADY_EXISTS_ERROR: &str = "resource_already_exists_exception";

/// Default `index.max_result_window`: the engine rejects searches whose
/// `from + size` exceeds it.
pub const MAX_RESULT_WINDOW: u64 = 10_000;

/// Longest body excerpt kept in an error message.
const MAX_REASON_LEN: usize = 512;

/// Search engine transport backed by an Elasticsearch cluster.
#[derive(Debug, Clone)]
pub struct ElasticsearchTransport {
    client: Client,
    base_url: Url,
}

impl ElasticsearchTransport {
    /// Creates a transport with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a transport whose requests fail after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IndexError::Connectivity(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    /// Cluster base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the URL for a path below the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| IndexError::Connectivity(format!("base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        Ok(self.client.request(method, self.endpoint(segments)?))
    }

    async fn post_search(&self, index: &str, body: &Value) -> Result<SearchResponse> {
        debug!(index, query = %body, "sending search request");

        let response = self
            .request(Method::POST, &[index, "_search"])?
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(engine_error(response).await);
        }
        Ok(response.json().await?)
    }
}

/// Turns a non-success response into an engine error.
async fn engine_error(response: Response) -> IndexError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    IndexError::Engine {
        status,
        reason: error_reason(&body),
    }
}

/// Extracts `error.type` from an Elasticsearch error body, or an excerpt.
fn error_reason(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            let error = v.get("error")?;
            let kind = error.get("type").and_then(Value::as_str);
            let reason = error.get("reason").and_then(Value::as_str);
            match (kind, reason) {
                (Some(kind), Some(reason)) => Some(format!("{kind}: {reason}")),
                (Some(kind), None) => Some(kind.to_string()),
                _ => error.as_str().map(str::to_string),
            }
        })
        .unwrap_or_else(|| body.chars().take(MAX_REASON_LEN).collect())
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<HitEnvelope>,
}

/// `hits.total` is an object on 7.x+ and a bare number on older clusters.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Object { value: u64 },
    Count(u64),
}

impl TotalHits {
    const fn value(&self) -> u64 {
        match self {
            Self::Object { value } | Self::Count(value) => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HitEnvelope {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(rename = "_source", default)]
    source: Option<Value>,
}

/// Renders the `_search` request body.
fn search_body(request: &SearchRequest) -> Value {
    json!({
        "query": request.query.to_json(),
        "from": request.offset,
        "size": request.limit,
        "sort": [ { request.sort.field: { "order": request.sort.order.as_str() } } ],
        "track_total_hits": true
    })
}

/// Renders a body that only counts matches.
fn count_body(request: &SearchRequest) -> Value {
    json!({
        "query": request.query.to_json(),
        "size": 0,
        "track_total_hits": true
    })
}

/// True when the requested window reaches past [`MAX_RESULT_WINDOW`].
fn exceeds_result_window(request: &SearchRequest) -> bool {
    request.offset.saturating_add(u64::from(request.limit)) > MAX_RESULT_WINDOW
}

impl SearchTransport for ElasticsearchTransport {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let response = self.request(Method::HEAD, &[index])?.send().await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(engine_error(response).await),
        }
    }

    async fn create_index(&self, index: &str, schema: &IndexSchema) -> Result<()> {
        let body = json!({ "mappings": schema.to_mappings() });
        let response = self.request(Method::PUT, &[index])?.json(&body).send().await?;

        if response.status().is_success() {
            return Ok(());
        }
        match engine_error(response).await {
            IndexError::Engine { reason, .. } if reason.starts_with(ALREADY_EXISTS_ERROR) => {
                Err(IndexError::AlreadyExists(index.to_string()))
            }
            other => Err(other),
        }
    }

    async fn index_document(&self, index: &str, source: &Value) -> Result<DocumentId> {
        let response = self
            .request(Method::POST, &[index, "_doc"])?
            .json(source)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(engine_error(response).await);
        }
        let body: IndexResponse = response.json().await?;
        Ok(DocumentId(body.id))
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchHits> {
        if exceeds_result_window(request) {
            // A page past the last match is empty, not an engine error.
            let counted = self.post_search(index, &count_body(request)).await?;
            let total = counted.hits.total.as_ref().map_or(0, TotalHits::value);
            if request.offset >= total {
                debug!(index, offset = request.offset, total, "page starts past the last match");
                return Ok(SearchHits {
                    total,
                    hits: Vec::new(),
                });
            }
        }

        let body = self.post_search(index, &search_body(request)).await?;
        Ok(SearchHits {
            total: body.hits.total.as_ref().map_or(0, TotalHits::value),
            hits: body
                .hits
                .hits
                .into_iter()
                .map(|h| RawHit {
                    id: h.id,
                    source: h.source,
                })
                .collect(),
        })
    }
}
