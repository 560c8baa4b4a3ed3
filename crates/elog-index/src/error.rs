//! Error types for index and search operations.

use thiserror::Error;

/// Errors that can occur while talking to the search engine.
///
/// Every variant is an I/O failure from the caller's point of view: the
/// HTTP layer maps all of them to a generic internal error.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The search engine could not be reached or the request timed out.
    #[error("search engine unreachable: {0}")]
    Connectivity(String),

    /// The search engine answered with a status the operation does not expect.
    #[error("search engine returned {status}: {reason}")]
    Engine {
        /// HTTP status code returned by the engine.
        status: u16,
        /// Error type or body excerpt reported by the engine.
        reason: String,
    },

    /// Index creation failed because the index already exists.
    #[error("index already exists: {0}")]
    AlreadyExists(String),

    /// A request or response body could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IndexError {
    /// Returns true for errors that surface to callers as I/O failures.
    ///
    /// `AlreadyExists` is excluded: provisioning recovers from it.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        !matches!(self, Self::AlreadyExists(_))
    }
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Engine {
                status: err.status().map_or(0, |s| s.as_u16()),
                reason: format!("undecodable response: {err}"),
            };
        }
        Self::Connectivity(err.to_string())
    }
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
