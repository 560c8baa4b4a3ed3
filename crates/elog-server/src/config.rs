//! Server configuration.
//!
//! [`Args`] is the raw command line / environment input; [`ServerConfig`]
//! is its validated form. Validation runs once at startup and any failure
//! stops the process before the listener binds.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use url::Url;

/// Default route prefix for the log endpoints.
pub const DEFAULT_ENDPOINT_PATH: &str = "/api/logs";

/// Liveness probe route, reserved for the server itself.
pub const HEALTH_PATH: &str = "/health";

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Default search engine request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Longest index name Elasticsearch accepts, in bytes.
const MAX_INDEX_NAME_LEN: usize = 255;

/// Characters Elasticsearch rejects in index names.
const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// Errors detected while validating configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No search engine address was supplied.
    #[error("ELASTICSEARCH_URL is required")]
    MissingElasticsearchUrl,

    /// The search engine address is not a usable URL.
    #[error("ELASTICSEARCH_URL must be a valid URL with scheme, host and port (e.g. http://localhost:9200): {0}")]
    InvalidElasticsearchUrl(String),

    /// No index name was supplied.
    #[error("LOG_INDEX_NAME is required")]
    MissingIndexName,

    /// The index name breaks the engine's naming rules.
    #[error("invalid index name {name:?}: {reason}")]
    InvalidIndexName {
        /// The rejected name
        name: String,
        /// Which rule it breaks
        reason: &'static str,
    },

    /// The endpoint path cannot be used as a route.
    #[error("invalid endpoint path {0:?}: must start with '/', contain no '{{' or '}}' and differ from /health")]
    InvalidEndpointPath(String),
}

/// Which search transport the server talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// An Elasticsearch cluster at the given base URL
    Elasticsearch(Url),
    /// The in-process engine; data is lost on exit
    InMemory,
}

/// Command line arguments; each flag can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "elogger")]
#[command(about = "Ingest structured logs over HTTP and search them in Elasticsearch")]
#[command(version)]
pub struct Args {
    /// Elasticsearch base URL, e.g. http://localhost:9200
    #[arg(long, env = "ELASTICSEARCH_URL")]
    pub elasticsearch_url: Option<String>,

    /// Index that receives log documents
    #[arg(long, env = "LOG_INDEX_NAME")]
    pub index_name: Option<String>,

    /// Route prefix for the log endpoints
    #[arg(long, env = "LOG_ENDPOINT_PATH", default_value = DEFAULT_ENDPOINT_PATH)]
    pub endpoint_path: String,

    /// Kibana URL announced at startup
    #[arg(long, env = "KIBANA_URL")]
    pub kibana_url: Option<String>,

    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    pub bind: SocketAddr,

    /// Search engine request timeout in seconds
    #[arg(long, env = "ELASTICSEARCH_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Keep logs in process memory instead of Elasticsearch
    #[arg(long)]
    pub in_memory: bool,
}

impl Args {
    /// Validates the arguments into a server configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the index name or search engine URL is missing
    /// or malformed, or the endpoint path is unusable.
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let index_name = self
            .index_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingIndexName)?;
        validate_index_name(index_name)?;

        let backend = if self.in_memory {
            Backend::InMemory
        } else {
            let raw = self
                .elasticsearch_url
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or(ConfigError::MissingElasticsearchUrl)?;
            Backend::Elasticsearch(parse_elasticsearch_url(raw)?)
        };

        let endpoint_path = normalize_endpoint_path(&self.endpoint_path)?;

        Ok(ServerConfig {
            bind_addr: self.bind,
            backend,
            index_name: index_name.to_string(),
            endpoint_path,
            kibana_url: self.kibana_url.filter(|s| !s.trim().is_empty()),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }
}

/// Validated server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,
    /// Search engine to store logs in.
    pub backend: Backend,
    /// Target index name.
    pub index_name: String,
    /// Route prefix for the log endpoints.
    pub endpoint_path: String,
    /// Kibana URL announced at startup.
    pub kibana_url: Option<String>,
    /// Search engine request timeout.
    pub request_timeout: Duration,
}

impl ServerConfig {
    /// Creates a configuration for the in-memory backend with defaults.
    #[must_use]
    pub fn in_memory(index_name: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            backend: Backend::InMemory,
            index_name: index_name.into(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            kibana_url: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Set the bind address.
    #[must_use]
    pub const fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the endpoint path.
    #[must_use]
    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    /// Set the Kibana URL.
    #[must_use]
    pub fn with_kibana_url(mut self, url: impl Into<String>) -> Self {
        self.kibana_url = Some(url.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Parses the search engine URL, defaulting the scheme to `http`.
///
/// # Errors
///
/// Returns an error if the result has no host or port.
pub fn parse_elasticsearch_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| ConfigError::InvalidElasticsearchUrl(format!("{raw}: {e}")))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidElasticsearchUrl(format!("{raw}: missing host")));
    }
    if url.port_or_known_default().is_none_or(|p| p == 0) {
        return Err(ConfigError::InvalidElasticsearchUrl(format!("{raw}: missing port")));
    }
    Ok(url)
}

/// Checks an index name against the engine's naming rules.
///
/// # Errors
///
/// Returns an error naming the first rule the name breaks.
pub fn validate_index_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidIndexName {
        name: name.to_string(),
        reason,
    };

    if name == "." || name == ".." {
        return Err(invalid("must not be '.' or '..'"));
    }
    if name.len() > MAX_INDEX_NAME_LEN {
        return Err(invalid("longer than 255 bytes"));
    }
    if name.starts_with(['-', '_', '+']) {
        return Err(invalid("must not start with '-', '_' or '+'"));
    }
    if name.chars().any(char::is_uppercase) {
        return Err(invalid("must be lowercase"));
    }
    if name.contains(FORBIDDEN_INDEX_CHARS) {
        return Err(invalid("contains a forbidden character"));
    }
    Ok(())
}

/// Normalizes the route prefix: leading `/` required, trailing `/` dropped.
///
/// # Errors
///
/// Returns an error if the path does not start with `/`, contains route
/// capture braces, or collides with [`HEALTH_PATH`].
pub fn normalize_endpoint_path(path: &str) -> Result<String, ConfigError> {
    let path = path.trim();
    if !path.starts_with('/') || path.contains(['{', '}']) {
        return Err(ConfigError::InvalidEndpointPath(path.to_string()));
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok("/".to_string());
    }
    if trimmed == HEALTH_PATH {
        return Err(ConfigError::InvalidEndpointPath(path.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["elogger"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_full_config() {
        let config = parse(&[
            "--elasticsearch-url",
            "es.internal:9200",
            "--index-name",
            "app-logs",
            "--endpoint-path",
            "/v1/logs/",
            "--kibana-url",
            "http://kibana:5601",
            "--bind",
            "127.0.0.1:9000",
            "--request-timeout-secs",
            "5",
        ])
        .into_config()
        .unwrap();

        assert_eq!(
            config.backend,
            Backend::Elasticsearch(Url::parse("http://es.internal:9200").unwrap())
        );
        assert_eq!(config.index_name, "app-logs");
        assert_eq!(config.endpoint_path, "/v1/logs");
        assert_eq!(config.kibana_url.as_deref(), Some("http://kibana:5601"));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--elasticsearch-url", "http://localhost:9200", "--index-name", "logs"])
            .into_config()
            .unwrap();

        assert_eq!(config.endpoint_path, DEFAULT_ENDPOINT_PATH);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.kibana_url.is_none());
    }

    #[test]
    fn test_missing_index_name_fails() {
        let err = parse(&["--elasticsearch-url", "http://localhost:9200"])
            .into_config()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingIndexName);

        let err = parse(&["--elasticsearch-url", "http://localhost:9200", "--index-name", "  "])
            .into_config()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingIndexName);
    }

    #[test]
    fn test_missing_url_fails() {
        let err = parse(&["--index-name", "logs"]).into_config().unwrap_err();
        assert_eq!(err, ConfigError::MissingElasticsearchUrl);
    }

    #[test]
    fn test_in_memory_needs_no_url() {
        let config = parse(&["--index-name", "logs", "--in-memory"])
            .into_config()
            .unwrap();
        assert_eq!(config.backend, Backend::InMemory);
    }

    #[test_case("localhost:9200", "http://localhost:9200/" ; "scheme added")]
    #[test_case("https://es.example.com:9243", "https://es.example.com:9243/" ; "https kept")]
    #[test_case("  http://10.0.0.5:9200  ", "http://10.0.0.5:9200/" ; "whitespace trimmed")]
    #[test_case("http://es.example.com", "http://es.example.com/" ; "default port")]
    fn test_url_accepted(raw: &str, expected: &str) {
        assert_eq!(parse_elasticsearch_url(raw).unwrap().as_str(), expected);
    }

    #[test_case("http://" ; "no host")]
    #[test_case("http://:9200" ; "empty host")]
    #[test_case("http://host:notaport" ; "bad port")]
    fn test_url_rejected(raw: &str) {
        assert!(matches!(
            parse_elasticsearch_url(raw),
            Err(ConfigError::InvalidElasticsearchUrl(_))
        ));
    }

    #[test_case("logs" ; "simple")]
    #[test_case("app-logs-2024.06" ; "dashes and dots")]
    #[test_case(".hidden" ; "leading dot")]
    fn test_index_name_accepted(name: &str) {
        assert!(validate_index_name(name).is_ok());
    }

    #[test_case("Logs" ; "uppercase")]
    #[test_case("-logs" ; "leading dash")]
    #[test_case("_logs" ; "leading underscore")]
    #[test_case("+logs" ; "leading plus")]
    #[test_case("my logs" ; "space")]
    #[test_case("a/b" ; "slash")]
    #[test_case("a*b" ; "wildcard")]
    #[test_case("a#b" ; "hash")]
    #[test_case(".." ; "dot dot")]
    fn test_index_name_rejected(name: &str) {
        assert!(matches!(
            validate_index_name(name),
            Err(ConfigError::InvalidIndexName { .. })
        ));
    }

    #[test]
    fn test_index_name_too_long() {
        let name = "a".repeat(256);
        assert!(validate_index_name(&name).is_err());
        assert!(validate_index_name(&name[..255]).is_ok());
    }

    #[test_case("/api/logs", "/api/logs" ; "unchanged")]
    #[test_case("/api/logs/", "/api/logs" ; "trailing slash")]
    #[test_case("/", "/" ; "root")]
    fn test_endpoint_path_normalized(raw: &str, expected: &str) {
        assert_eq!(normalize_endpoint_path(raw).unwrap(), expected);
    }

    #[test_case("api/logs" ; "no leading slash")]
    #[test_case("/logs/{id}" ; "capture braces")]
    #[test_case("/health" ; "health route")]
    #[test_case("/health/" ; "health route trailing slash")]
    fn test_endpoint_path_rejected(raw: &str) {
        assert!(matches!(
            normalize_endpoint_path(raw),
            Err(ConfigError::InvalidEndpointPath(_))
        ));
    }

    #[test]
    fn test_health_endpoint_path_fails_config() {
        let err = parse(&["--index-name", "logs", "--in-memory", "--endpoint-path", "/health/"])
            .into_config()
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidEndpointPath("/health/".to_string()));
    }

    #[test_case("/healthz" ; "longer name")]
    #[test_case("/health/logs" ; "nested below health")]
    fn test_endpoint_path_near_health_accepted(raw: &str) {
        assert_eq!(normalize_endpoint_path(raw).unwrap(), raw);
    }

    #[test]
    fn test_config_builder() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let config = ServerConfig::in_memory("logs")
            .with_bind_addr(addr)
            .with_endpoint_path("/logs")
            .with_kibana_url("http://kibana")
            .with_request_timeout(Duration::from_secs(1));

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.endpoint_path, "/logs");
        assert_eq!(config.kibana_url.as_deref(), Some("http://kibana"));
        assert_eq!(config.request_timeout, Duration::from_secs(1));
        assert_eq!(config.backend, Backend::InMemory);
    }
}
