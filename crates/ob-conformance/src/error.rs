//! Conformance error types.

use std::time::Duration;

use thiserror::Error;

/// Errors from a [`DocumentLoader`](crate::DocumentLoader).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    /// The loader has no document for this URL.
    #[error("no context document available for {url}")]
    NotFound {
        /// Requested context URL.
        url: String,
    },

    /// Transport-level failure (connection refused, TLS, timeout inside the client).
    #[error("HTTP error fetching {url}: {reason}")]
    Http {
        /// Requested context URL.
        url: String,
        /// Transport error description.
        reason: String,
    },

    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested context URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body is not JSON.
    #[error("{url} is not a JSON document: {reason}")]
    Parse {
        /// Requested context URL.
        url: String,
        /// Parse error description.
        reason: String,
    },

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Errors from conformance validation. Any of these rejects the document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConformanceError {
    /// The document loader failed for a referenced context.
    #[error("loading context {url} failed: {source}")]
    Loader {
        /// Context URL being loaded.
        url: String,
        /// Underlying loader failure.
        source: LoaderError,
    },

    /// The configured loader could not be constructed.
    #[error("context loader unavailable: {0}")]
    LoaderSetup(LoaderError),

    /// The document loader did not answer in time.
    #[error("loading context {url} timed out after {timeout:?}")]
    Timeout {
        /// Context URL being loaded.
        url: String,
        /// Configured deadline.
        timeout: Duration,
    },

    /// A context value or loaded context document is malformed.
    #[error("invalid JSON-LD context: {0}")]
    InvalidContext(String),

    /// Expanding one document needed more context documents than allowed.
    #[error("expansion loaded more than {0} context documents")]
    ContextTooDeep(usize),

    /// The JSON-LD processor rejected the document or one of its contexts.
    #[error("JSON-LD expansion failed: {0}")]
    Expansion(String),

    /// One or more terms in the document do not resolve under the active context.
    #[error("{} term(s) do not resolve: {}", .0.len(), .0.join("; "))]
    UnresolvedTerms(Vec<String>),

    /// The document violates the bundled structural schema.
    #[error("document violates the assertion schema:\n{0}")]
    Schema(String),

    /// The bundled structural schema could not be compiled.
    #[error("assertion schema could not be compiled: {0}")]
    SchemaBuild(String),
}
