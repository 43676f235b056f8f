//! # Assertion Serializer
//!
//! The single entry point of the engine. A call:
//!
//! 1. parses the requested version (unknown versions fail fast);
//! 2. runs every entry of that version's [`VersionPlan`] in order: codecs,
//!    recipient resolution, badge-class embedding;
//! 3. prepends the header;
//! 4. for 1.1, submits the assembled document to the
//!    [`ConformanceValidator`].
//!
//! The first failure aborts the call. No partial document is ever returned.

use std::sync::Arc;

use serde_json::{Map, Value};

use ob_conformance::ConformanceValidator;
use ob_core::codec::decode_url;
use ob_core::{SerializationError, SpecVersion, OPEN_BADGES_V1_CONTEXT};

use crate::badge_class::{
    embed_badge_class, BadgeClassSerializer, BadgeEmbedding, StandardBadgeClassSerializer,
};
use crate::instance::StoredBadgeInstance;
use crate::plan::{plan_for, FieldSpec, PlanEntry, VersionPlan};
use crate::recipient::{resolve_recipient, RecipientContext};

/// An insertion-ordered output document.
pub type Document = Map<String, Value>;

/// Per-call serialization options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// The assertion is nested inside a parent document: `@context` is
    /// suppressed and the badge class is always embedded.
    pub embedded: bool,
    /// Whether the badge class appears inline or as a URL.
    pub badge_class: BadgeEmbedding,
    /// Recipient identity disclosed to the badge-class collaborator.
    pub recipient: RecipientContext,
}

impl SerializeOptions {
    /// Options for a document nested inside another.
    pub fn embedded() -> Self {
        Self {
            embedded: true,
            ..Self::default()
        }
    }
}

/// Serializes stored badge instances into versioned Open Badges documents.
#[derive(Clone)]
pub struct AssertionSerializer {
    conformance: Arc<ConformanceValidator>,
    badge_classes: Arc<dyn BadgeClassSerializer>,
}

impl std::fmt::Debug for AssertionSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssertionSerializer")
            .field("conformance", &self.conformance)
            .finish_non_exhaustive()
    }
}

impl AssertionSerializer {
    /// Serializer using `conformance` for 1.1 documents and the standard
    /// badge-class field sets.
    pub fn new(conformance: Arc<ConformanceValidator>) -> Self {
        Self {
            conformance,
            badge_classes: Arc::new(StandardBadgeClassSerializer),
        }
    }

    /// Replace the badge-class collaborator.
    pub fn with_badge_classes(mut self, badge_classes: Arc<dyn BadgeClassSerializer>) -> Self {
        self.badge_classes = badge_classes;
        self
    }

    /// Serialize `instance` for the version named by `version`.
    ///
    /// # Errors
    ///
    /// [`SerializationError::UnknownVersion`] for a version outside the
    /// supported set; otherwise as [`serialize_version`](Self::serialize_version).
    pub async fn serialize(
        &self,
        instance: &StoredBadgeInstance,
        version: &str,
        options: &SerializeOptions,
    ) -> Result<Document, SerializationError> {
        let version: SpecVersion = version.parse().map_err(|e: SerializationError| {
            tracing::error!(error = %e, "unsupported assertion version requested");
            e
        })?;
        self.serialize_version(instance, version, options).await
    }

    /// Serialize `instance` for `version`.
    pub async fn serialize_version(
        &self,
        instance: &StoredBadgeInstance,
        version: SpecVersion,
        options: &SerializeOptions,
    ) -> Result<Document, SerializationError> {
        let plan = plan_for(version);
        tracing::debug!(
            version = %version,
            instance = instance.instance_url(),
            embedded = options.embedded,
            "serializing assertion"
        );

        let document = match self.assemble(instance, plan, options) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(
                    version = %version,
                    field = e.field().unwrap_or_default(),
                    kind = %e.kind(),
                    error = %e,
                    "assertion rejected"
                );
                return Err(e);
            }
        };

        if plan.conformance {
            if let Err(e) = self
                .conformance
                .validate(&document, OPEN_BADGES_V1_CONTEXT)
                .await
            {
                tracing::warn!(
                    version = %version,
                    instance = instance.instance_url(),
                    error = %e,
                    "assertion failed conformance"
                );
                return Err(SerializationError::ConformanceFailure {
                    version,
                    reason: e.to_string(),
                });
            }
        }

        Ok(document)
    }

    /// Validate every plan entry and build the ordered document.
    fn assemble(
        &self,
        instance: &StoredBadgeInstance,
        plan: &VersionPlan,
        options: &SerializeOptions,
    ) -> Result<Document, SerializationError> {
        let version = plan.version;
        let instance_url =
            decode_url(instance.instance_url()).map_err(|e| e.at("instanceUrl", version))?;

        let mut body: Vec<(&'static str, Value)> = Vec::with_capacity(plan.entries.len());
        for entry in plan.entries {
            match entry {
                PlanEntry::Field(spec) => {
                    if let Some(value) = decode_field(instance, spec, version)? {
                        if let Some(output) = spec.output {
                            body.push((output, value));
                        }
                    }
                }
                PlanEntry::Recipient => {
                    body.push(("recipient", resolve_recipient(instance, plan.recipient, version)?));
                }
                PlanEntry::Badge => {
                    let badge = embed_badge_class(
                        instance.badge_class(),
                        options.badge_class,
                        options.embedded,
                        version,
                        self.badge_classes.as_ref(),
                        &options.recipient,
                    )?;
                    body.push(("badge", badge));
                }
            }
        }

        let mut document = Document::new();
        for (key, value) in plan.header.fields(&instance_url, options.embedded) {
            document.insert(key.to_string(), value);
        }
        for (key, value) in body {
            document.insert(key.to_string(), value);
        }
        Ok(document)
    }
}

fn decode_field(
    instance: &StoredBadgeInstance,
    spec: &FieldSpec,
    version: SpecVersion,
) -> Result<Option<Value>, SerializationError> {
    let raw = match (instance.get(spec.source), spec.fallback) {
        (None | Some(Value::Null), Some(fallback)) => instance.get(fallback),
        (raw, _) => raw,
    };
    spec.codec
        .decode(raw, spec.presence)
        .map_err(|e| e.at(spec.source, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ob_core::ErrorKind;
    use serde_json::json;

    fn serializer() -> AssertionSerializer {
        AssertionSerializer::new(Arc::new(ConformanceValidator::bundled().unwrap()))
    }

    fn instance(json: Value) -> StoredBadgeInstance {
        StoredBadgeInstance::new("https://example.org/a/1", json.as_object().cloned().unwrap())
    }

    fn badge_0_5() -> Value {
        json!({
            "name": "Robotics",
            "description": "Robots.",
            "image": "https://example.org/robotics.png",
            "criteria": "https://example.org/robotics/criteria",
            "issuer": {"origin": "https://example.org", "name": "Example Org"}
        })
    }

    #[tokio::test]
    async fn unknown_version_fails_fast() {
        let err = serializer()
            .serialize(&instance(json!({})), "2.0", &SerializeOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, SerializationError::UnknownVersion("2.0".into()));
    }

    #[tokio::test]
    async fn stored_issued_on_renamed_and_normalized() {
        let doc = serializer()
            .serialize(
                &instance(json!({
                    "recipient": "alice@example.org",
                    "issued_on": "2013-11-05",
                    "badge": badge_0_5()
                })),
                "0.5.0",
                &SerializeOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(doc["issuedOn"], "2013-11-05T00:00:00Z");
        assert!(doc.get("issued_on").is_none());
    }

    #[tokio::test]
    async fn absent_optional_fields_omitted() {
        let doc = serializer()
            .serialize(
                &instance(json!({"recipient": "alice@example.org", "badge": badge_0_5()})),
                "0.5.0",
                &SerializeOptions::default(),
            )
            .await
            .unwrap();
        let keys: Vec<&String> = doc.keys().collect();
        assert_eq!(keys, ["@context", "type", "id", "recipient", "badge"]);
    }

    #[tokio::test]
    async fn invalid_optional_field_still_fails() {
        let err = serializer()
            .serialize(
                &instance(json!({
                    "recipient": "alice@example.org",
                    "evidence": "not a url",
                    "badge": badge_0_5()
                })),
                "0.5.0",
                &SerializeOptions::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        assert_eq!(err.field(), Some("evidence"));
        assert_eq!(err.version(), Some(SpecVersion::V0_5_0));
    }

    #[tokio::test]
    async fn invalid_instance_url_rejected() {
        let bad = StoredBadgeInstance::new(
            "/relative/1",
            json!({"recipient": "alice@example.org", "badge": badge_0_5()})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let err = serializer()
            .serialize(&bad, "0.5.0", &SerializeOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("instanceUrl"));
    }

    #[tokio::test]
    async fn embedded_options_suppress_context() {
        let doc = serializer()
            .serialize(
                &instance(json!({"recipient": "alice@example.org", "badge": badge_0_5()})),
                "0.5.1",
                &SerializeOptions::embedded(),
            )
            .await
            .unwrap();
        assert!(doc.get("@context").is_none());
        assert_eq!(doc["type"], "Assertion");
        assert_eq!(doc["id"], "https://example.org/a/1");
    }
}
