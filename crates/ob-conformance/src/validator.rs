//! # Conformance Validator
//!
//! Checks that an assembled 1.1 document is meaningful JSON-LD under its
//! contexts and satisfies the bundled assertion schema.
//!
//! ## Procedure
//!
//! 1. Verdict cache: a document already accepted under the same default
//!    context is accepted again without any work.
//! 2. Structural check against [`AssertionSchema`].
//! 3. JSON-LD expansion with the `json-ld` processor, the default context
//!    layered beneath the document's own `@context`. Remote contexts,
//!    including `@import`ed and scoped ones, are fetched through the
//!    [`DocumentLoader`], each load bounded by the configured timeout.
//! 4. Every key and `type` value the expansion dropped or could not map to
//!    an IRI is reported.
//!
//! ## Caching
//!
//! Context documents are cached by URL; failed loads are never cached.
//! Positive verdicts are cached by default context plus the SHA-256 of the
//! JCS-canonical document bytes. The verdict cache is cleared when it
//! reaches capacity.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::{DashMap, DashSet};
use iref::Iri;
use json_ld::syntax::Parse;
use json_ld::{JsonLdProcessor, RemoteDocument};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::config::{ConformanceConfig, LoaderKind, DEFAULT_CACHE_ENTRIES};
use crate::error::ConformanceError;
use crate::expansion::PreparedDocument;
use crate::loader::{DocumentLoader, HttpLoader, StaticLoader};
use crate::schema::AssertionSchema;

/// Maximum number of context documents loaded while expanding one document.
pub const MAX_CONTEXT_LOADS: usize = 16;

/// Validates serialized documents against JSON-LD contexts and the
/// assertion schema. Cheap to share behind an `Arc`.
pub struct ConformanceValidator {
    loader: Arc<dyn DocumentLoader>,
    timeout: Duration,
    cache_entries: usize,
    contexts: DashMap<String, Arc<Value>>,
    verdicts: DashSet<String>,
    schema: AssertionSchema,
}

impl fmt::Debug for ConformanceValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConformanceValidator")
            .field("timeout", &self.timeout)
            .field("cache_entries", &self.cache_entries)
            .field("cached_contexts", &self.contexts.len())
            .field("cached_verdicts", &self.verdicts.len())
            .finish_non_exhaustive()
    }
}

impl ConformanceValidator {
    /// Build a validator around `loader` with default limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::SchemaBuild`] if the bundled schema does
    /// not compile.
    pub fn new(loader: Arc<dyn DocumentLoader>) -> Result<Self, ConformanceError> {
        Ok(Self {
            loader,
            timeout: ConformanceConfig::default().timeout(),
            cache_entries: DEFAULT_CACHE_ENTRIES,
            contexts: DashMap::new(),
            verdicts: DashSet::new(),
            schema: AssertionSchema::bundled()?,
        })
    }

    /// Offline validator using the bundled Open Badges v1 context.
    pub fn bundled() -> Result<Self, ConformanceError> {
        let loader = StaticLoader::bundled().map_err(ConformanceError::LoaderSetup)?;
        Self::new(Arc::new(loader))
    }

    /// Validator fetching contexts over HTTP, each load bounded by `timeout`.
    pub fn remote(timeout: Duration) -> Result<Self, ConformanceError> {
        let loader = HttpLoader::new(timeout).map_err(ConformanceError::LoaderSetup)?;
        Ok(Self::new(Arc::new(loader))?.with_timeout(timeout))
    }

    /// Validator built from configuration.
    pub fn from_config(config: &ConformanceConfig) -> Result<Self, ConformanceError> {
        let validator = match config.loader {
            LoaderKind::Remote => Self::remote(config.timeout())?,
            LoaderKind::Bundled => Self::bundled()?,
        };
        Ok(validator
            .with_timeout(config.timeout())
            .with_cache_entries(config.cache_entries))
    }

    /// Replace the per-load deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the verdict-cache capacity. Zero disables verdict caching.
    pub fn with_cache_entries(mut self, entries: usize) -> Self {
        self.cache_entries = entries;
        self
    }

    /// Per-load deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of positive verdicts currently cached.
    pub fn cached_verdicts(&self) -> usize {
        self.verdicts.len()
    }

    /// Number of context documents currently cached.
    pub fn cached_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// Validate `doc`, using `default_context` beneath the document's own
    /// `@context` (and alone when the document carries none).
    ///
    /// # Errors
    ///
    /// Any [`ConformanceError`] rejects the document.
    pub async fn validate(
        &self,
        doc: &Map<String, Value>,
        default_context: &str,
    ) -> Result<(), ConformanceError> {
        let key = verdict_key(doc, default_context);
        if let Some(key) = &key {
            if self.verdicts.contains(key) {
                tracing::debug!(default_context, "conformance verdict cache hit");
                return Ok(());
            }
        }

        self.schema.check(&Value::Object(doc.clone()))?;

        let prepared = PreparedDocument::new(doc, default_context);
        let violations = self.expand(&prepared).await?;
        if !violations.is_empty() {
            tracing::debug!(count = violations.len(), "unresolved terms");
            return Err(ConformanceError::UnresolvedTerms(violations));
        }

        if let Some(key) = key {
            self.remember(key);
        }
        Ok(())
    }

    fn remember(&self, key: String) {
        if self.cache_entries == 0 {
            return;
        }
        if self.verdicts.len() >= self.cache_entries {
            self.verdicts.clear();
        }
        self.verdicts.insert(key);
    }

    /// Expand the prepared document and list what the expansion lost.
    async fn expand(&self, prepared: &PreparedDocument) -> Result<Vec<String>, ConformanceError> {
        let input = to_syntax(prepared.document()).ok_or_else(|| {
            ConformanceError::Expansion("document could not be re-read as JSON".into())
        })?;
        let input: RemoteDocument = RemoteDocument::new(None, None, input);

        let mut bridge = ContextBridge::new(self);
        let expanded = match input.expand(&mut bridge).await {
            Ok(expanded) => expanded,
            Err(e) => {
                let err = bridge
                    .take_failure()
                    .unwrap_or_else(|| ConformanceError::Expansion(e.to_string()));
                tracing::debug!(error = %err, "expansion failed");
                return Err(err);
            }
        };
        Ok(prepared.unresolved(&expanded))
    }

    /// The context document at `url`, from cache or loader.
    async fn context_document(&self, url: &str) -> Result<Arc<Value>, ConformanceError> {
        if let Some(cached) = self.contexts.get(url) {
            return Ok(Arc::clone(cached.value()));
        }

        let loaded = tokio::time::timeout(self.timeout, self.loader.load(url))
            .await
            .map_err(|_| {
                tracing::warn!(url, timeout = ?self.timeout, "context load timed out");
                ConformanceError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                }
            })?
            .map_err(|e| {
                tracing::warn!(url, error = %e, "context load failed");
                ConformanceError::Loader {
                    url: url.to_string(),
                    source: e,
                }
            })?;

        match &loaded {
            Value::Object(document) if document.contains_key("@context") => {}
            Value::Object(_) => {
                return Err(ConformanceError::InvalidContext(format!(
                    "{url} has no @context entry"
                )))
            }
            _ => {
                return Err(ConformanceError::InvalidContext(format!(
                    "{url} is not a JSON object"
                )))
            }
        }

        let document = Arc::new(loaded);
        self.contexts.insert(url.to_string(), Arc::clone(&document));
        Ok(document)
    }
}

/// Serves context documents to the JSON-LD processor from the validator's
/// cache and loader, keeping the first failure so it can be reported as is.
struct ContextBridge<'a> {
    validator: &'a ConformanceValidator,
    loads: AtomicUsize,
    failure: Mutex<Option<ConformanceError>>,
}

impl<'a> ContextBridge<'a> {
    fn new(validator: &'a ConformanceValidator) -> Self {
        Self {
            validator,
            loads: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    async fn fetch(&self, url: &str) -> Result<json_ld::syntax::Value, ConformanceError> {
        if self.loads.fetch_add(1, Ordering::Relaxed) >= MAX_CONTEXT_LOADS {
            return Err(ConformanceError::ContextTooDeep(MAX_CONTEXT_LOADS));
        }
        let document = self.validator.context_document(url).await?;
        to_syntax(&document).ok_or_else(|| {
            ConformanceError::InvalidContext(format!("{url} could not be re-read as JSON"))
        })
    }

    fn take_failure(&self) -> Option<ConformanceError> {
        self.failure.lock().ok().and_then(|mut failure| failure.take())
    }
}

impl json_ld::Loader for ContextBridge<'_> {
    async fn load(&self, url: &Iri) -> json_ld::LoadingResult {
        match self.fetch(url.as_str()).await {
            Ok(document) => Ok(RemoteDocument::new(Some(url.to_owned()), None, document)),
            Err(e) => {
                if let Ok(mut failure) = self.failure.lock() {
                    failure.get_or_insert_with(|| e.clone());
                }
                Err(json_ld::LoadError::new(url.to_owned(), e))
            }
        }
    }
}

fn to_syntax(value: &Value) -> Option<json_ld::syntax::Value> {
    let text = serde_json::to_string(value).ok()?;
    let (parsed, _) = json_ld::syntax::Value::parse_str(&text).ok()?;
    Some(parsed)
}

/// Cache key for a positive verdict, or `None` if the document cannot be
/// canonicalized.
fn verdict_key(doc: &Map<String, Value>, default_context: &str) -> Option<String> {
    let bytes = serde_jcs::to_vec(doc).ok()?;
    let digest = Sha256::digest(&bytes);
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    Some(format!("{default_context}#{hex}"))
}
