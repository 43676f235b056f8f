//! # Context Document Loaders
//!
//! Conformance checking needs the documents behind context URLs. Loading is a
//! collaborator: [`DocumentLoader`] is an object-safe async trait so callers
//! can plug in caching proxies, fixtures or pinned copies.
//!
//! Two implementations ship with the crate:
//!
//! - [`StaticLoader`]: an in-memory map of URL → document. [`StaticLoader::bundled()`]
//!   carries the Open Badges v1 context so validation works offline.
//! - [`HttpLoader`]: fetches over HTTP(S) with `reqwest`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LoaderError;
use ob_core::OPEN_BADGES_V1_CONTEXT;

const OPEN_BADGES_V1_DOCUMENT: &str = include_str!("../contexts/openbadges-v1.jsonld");

/// Resolves a context URL to its JSON document.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Fetch and parse the document at `url`.
    async fn load(&self, url: &str) -> Result<Value, LoaderError>;
}

// ---------------------------------------------------------------------------
// StaticLoader
// ---------------------------------------------------------------------------

/// Serves context documents from memory.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    documents: HashMap<String, Value>,
}

impl StaticLoader {
    /// An empty loader. Every URL is `NotFound`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader holding the bundled Open Badges v1 context.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Parse`] if the bundled document is not valid JSON.
    pub fn bundled() -> Result<Self, LoaderError> {
        let document: Value =
            serde_json::from_str(OPEN_BADGES_V1_DOCUMENT).map_err(|e| LoaderError::Parse {
                url: OPEN_BADGES_V1_CONTEXT.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::new().with_document(OPEN_BADGES_V1_CONTEXT, document))
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_document(mut self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    /// Register (or replace) the document served for `url`.
    pub fn insert(&mut self, url: impl Into<String>, document: Value) {
        self.documents.insert(url.into(), document);
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True if no documents are registered.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentLoader for StaticLoader {
    async fn load(&self, url: &str) -> Result<Value, LoaderError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| LoaderError::NotFound {
                url: url.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// HttpLoader
// ---------------------------------------------------------------------------

/// Fetches context documents over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::Client,
}

impl HttpLoader {
    /// Build a loader whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Client`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, LoaderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static(
                        "application/ld+json, application/json;q=0.9",
                    ),
                );
                headers
            })
            .build()
            .map_err(|e| LoaderError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentLoader for HttpLoader {
    async fn load(&self, url: &str) -> Result<Value, LoaderError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoaderError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LoaderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| LoaderError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&body).map_err(|e| LoaderError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}
