//! # Badge Classes
//!
//! The badge class of an assertion appears either as a nested object or as a
//! bare URL, never a mix. Rendering a badge-class record is a collaborator
//! concern behind [`BadgeClassSerializer`]; [`StandardBadgeClassSerializer`]
//! is the default, with one field set per [`BadgeClassSchema`].
//!
//! The embedder always calls the collaborator with `embedded: true` and
//! inserts its result unmodified, so an embedded badge class is exactly what
//! a direct embedded call would return.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use ob_core::codec::decode_url;
use ob_core::{
    FieldCodec, FieldError, Presence, SerializationError, SpecVersion, OPEN_BADGES_V1_CONTEXT,
};

use crate::instance::BadgeClassRef;
use crate::recipient::RecipientContext;

/// Badge-class field set, selected by assertion version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeClassSchema {
    /// 0.5 badge classes with an inline issuer object.
    V0_5,
    /// 1.0 badge classes referencing the issuer by URL.
    V1_0,
    /// 1.1 badge classes with a JSON-LD header.
    V1_1,
}

impl From<SpecVersion> for BadgeClassSchema {
    fn from(version: SpecVersion) -> Self {
        match version {
            SpecVersion::V0_5_0 | SpecVersion::V0_5_1 => Self::V0_5,
            SpecVersion::V1_0 => Self::V1_0,
            SpecVersion::V1_1 => Self::V1_1,
        }
    }
}

/// How the badge class should appear in a serialized assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeEmbedding {
    /// A nested badge-class object.
    #[default]
    Embed,
    /// The badge-class URL. Ignored when the assertion itself is embedded.
    Reference,
}

/// Call context handed to a [`BadgeClassSerializer`].
#[derive(Debug, Clone, Copy)]
pub struct BadgeClassContext<'a> {
    /// True when the badge class is nested inside another document.
    pub embedded: bool,
    /// Canonical badge-class URL, when known.
    pub url: Option<&'a str>,
    /// Recipient identity disclosed for this call.
    pub recipient: &'a RecipientContext,
}

/// Errors rendering a badge-class record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BadgeClassError {
    /// A required badge-class field is absent.
    #[error("badge class is missing required field {field:?}")]
    MissingField {
        /// Field name, dotted for nested fields.
        field: String,
    },

    /// A badge-class field has the wrong shape.
    #[error("badge class field {field:?} is invalid: {reason}")]
    InvalidField {
        /// Field name, dotted for nested fields.
        field: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl BadgeClassError {
    fn from_field(field: &str, error: FieldError) -> Self {
        match error {
            FieldError::Missing => Self::MissingField {
                field: field.to_string(),
            },
            other => Self::InvalidField {
                field: field.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Renders badge-class records for embedding.
pub trait BadgeClassSerializer: Send + Sync {
    /// Render `record` under `schema`.
    fn serialize(
        &self,
        record: &Map<String, Value>,
        schema: BadgeClassSchema,
        ctx: &BadgeClassContext<'_>,
    ) -> Result<Map<String, Value>, BadgeClassError>;
}

// ---------------------------------------------------------------------------
// Default collaborator
// ---------------------------------------------------------------------------

/// The Open Badges badge-class field sets.
///
/// | Schema | Fields |
/// |---|---|
/// | 0.5 | `name`, `description`, `image`, `criteria`, `issuer{origin, name, org?, contact?}` |
/// | 1.0 | `name`, `description`, `image`, `criteria`, `issuer` (URL), `alignment?`, `tags?` |
/// | 1.1 | `@context` (not embedded), `type`, `id`, then the 1.0 fields |
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBadgeClassSerializer;

const COMMON_FIELDS: [(&str, FieldCodec); 4] = [
    ("name", FieldCodec::Text),
    ("description", FieldCodec::Text),
    ("image", FieldCodec::ImageUrl),
    ("criteria", FieldCodec::Url),
];

const ISSUER_V0_5_FIELDS: [(&str, FieldCodec, Presence); 4] = [
    ("origin", FieldCodec::Url, Presence::Required),
    ("name", FieldCodec::Text, Presence::Required),
    ("org", FieldCodec::Text, Presence::Optional),
    ("contact", FieldCodec::Email, Presence::Optional),
];

impl BadgeClassSerializer for StandardBadgeClassSerializer {
    fn serialize(
        &self,
        record: &Map<String, Value>,
        schema: BadgeClassSchema,
        ctx: &BadgeClassContext<'_>,
    ) -> Result<Map<String, Value>, BadgeClassError> {
        let mut out = Map::new();

        if schema == BadgeClassSchema::V1_1 {
            if !ctx.embedded {
                out.insert("@context".into(), Value::String(OPEN_BADGES_V1_CONTEXT.into()));
            }
            FieldCodec::Literal("BadgeClass")
                .decode(record.get("type"), Presence::Optional)
                .map_err(|e| BadgeClassError::from_field("type", e))?;
            out.insert("type".into(), Value::String("BadgeClass".into()));
            let id = match ctx.url {
                Some(url) => Some(Value::String(url.to_string())),
                None => record.get("id").cloned(),
            };
            let id = FieldCodec::Url
                .decode(id.as_ref(), Presence::Required)
                .map_err(|e| BadgeClassError::from_field("id", e))?;
            if let Some(id) = id {
                out.insert("id".into(), id);
            }
        }

        for (field, codec) in COMMON_FIELDS {
            copy_field(record, &mut out, field, codec, Presence::Required)?;
        }

        match schema {
            BadgeClassSchema::V0_5 => {
                let issuer = non_null(record.get("issuer")).ok_or_else(|| BadgeClassError::MissingField {
                    field: "issuer".into(),
                })?;
                let issuer = issuer.as_object().ok_or_else(|| BadgeClassError::InvalidField {
                    field: "issuer".into(),
                    reason: format!("expected an issuer object, got {issuer}"),
                })?;
                let mut issuer_out = Map::new();
                for (field, codec, presence) in ISSUER_V0_5_FIELDS {
                    let decoded = codec
                        .decode(issuer.get(field), presence)
                        .map_err(|e| BadgeClassError::from_field(&format!("issuer.{field}"), e))?;
                    if let Some(value) = decoded {
                        issuer_out.insert(field.into(), value);
                    }
                }
                out.insert("issuer".into(), Value::Object(issuer_out));
            }
            BadgeClassSchema::V1_0 | BadgeClassSchema::V1_1 => {
                copy_field(record, &mut out, "issuer", FieldCodec::Url, Presence::Required)?;
                if let Some(alignment) = non_null(record.get("alignment")) {
                    match alignment {
                        Value::Array(items) if items.iter().all(Value::is_object) => {
                            out.insert("alignment".into(), alignment.clone());
                        }
                        other => {
                            return Err(BadgeClassError::InvalidField {
                                field: "alignment".into(),
                                reason: format!("expected an array of objects, got {other}"),
                            })
                        }
                    }
                }
                if let Some(tags) = non_null(record.get("tags")) {
                    match tags {
                        Value::Array(items) if items.iter().all(Value::is_string) => {
                            out.insert("tags".into(), tags.clone());
                        }
                        other => {
                            return Err(BadgeClassError::InvalidField {
                                field: "tags".into(),
                                reason: format!("expected an array of strings, got {other}"),
                            })
                        }
                    }
                }
            }
        }

        Ok(out)
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn copy_field(
    record: &Map<String, Value>,
    out: &mut Map<String, Value>,
    field: &str,
    codec: FieldCodec,
    presence: Presence,
) -> Result<(), BadgeClassError> {
    let decoded = codec
        .decode(record.get(field), presence)
        .map_err(|e| BadgeClassError::from_field(field, e))?;
    if let Some(value) = decoded {
        out.insert(field.to_string(), value);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Embedder
// ---------------------------------------------------------------------------

/// Fill the `badge` slot of an assertion.
///
/// When `assertion_embedded` is set the badge class is embedded regardless
/// of `mode`.
pub fn embed_badge_class(
    reference: Option<&BadgeClassRef>,
    mode: BadgeEmbedding,
    assertion_embedded: bool,
    version: SpecVersion,
    serializer: &dyn BadgeClassSerializer,
    recipient: &RecipientContext,
) -> Result<Value, SerializationError> {
    let mode = if assertion_embedded {
        BadgeEmbedding::Embed
    } else {
        mode
    };

    match mode {
        BadgeEmbedding::Reference => {
            let url = reference
                .and_then(BadgeClassRef::url)
                .ok_or_else(|| FieldError::Missing.at("badge", version))?;
            let url = decode_url(url).map_err(|e| e.at("badge", version))?;
            Ok(Value::String(url))
        }
        BadgeEmbedding::Embed => {
            let reference = reference.ok_or_else(|| FieldError::Missing.at("badge", version))?;
            let record = reference
                .record()
                .ok_or_else(|| FieldError::Missing.at("badge", version))?;
            let ctx = BadgeClassContext {
                embedded: true,
                url: reference.url(),
                recipient,
            };
            let rendered = serializer
                .serialize(record, BadgeClassSchema::from(version), &ctx)
                .map_err(|e| FieldError::invalid(e.to_string()).at("badge", version))?;
            Ok(Value::Object(rendered))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ob_core::ErrorKind;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn v1_record() -> Map<String, Value> {
        record(json!({
            "name": "Awesome Robotics Badge",
            "description": "For doing awesome things with robots.",
            "image": "https://example.org/robotics.png",
            "criteria": "https://example.org/robotics/criteria",
            "issuer": "https://example.org/issuer",
            "tags": ["robots"],
            "unexpected": "dropped"
        }))
    }

    fn v0_5_record() -> Map<String, Value> {
        record(json!({
            "version": "0.5.0",
            "name": "Robotics",
            "description": "Robots.",
            "image": "https://example.org/robotics.png",
            "criteria": "https://example.org/robotics/criteria",
            "issuer": {"origin": "https://example.org", "name": "Example Org", "contact": "badges@example.org"}
        }))
    }

    fn ctx<'a>(
        embedded: bool,
        url: Option<&'a str>,
        recipient: &'a RecipientContext,
    ) -> BadgeClassContext<'a> {
        BadgeClassContext {
            embedded,
            url,
            recipient,
        }
    }

    // ---- StandardBadgeClassSerializer ----

    #[test]
    fn v0_5_renders_issuer_object() {
        let anon = RecipientContext::anonymous();
        let out = StandardBadgeClassSerializer
            .serialize(&v0_5_record(), BadgeClassSchema::V0_5, &ctx(true, None, &anon))
            .unwrap();
        let keys: Vec<&String> = out.keys().collect();
        assert_eq!(keys, ["name", "description", "image", "criteria", "issuer"]);
        assert_eq!(
            out["issuer"],
            json!({"origin": "https://example.org", "name": "Example Org", "contact": "badges@example.org"})
        );
    }

    #[test]
    fn v0_5_missing_issuer_origin_reported() {
        let anon = RecipientContext::anonymous();
        let mut rec = v0_5_record();
        rec["issuer"].as_object_mut().unwrap().remove("origin");
        let err = StandardBadgeClassSerializer
            .serialize(&rec, BadgeClassSchema::V0_5, &ctx(true, None, &anon))
            .unwrap_err();
        assert_eq!(
            err,
            BadgeClassError::MissingField {
                field: "issuer.origin".into()
            }
        );
    }

    #[test]
    fn v1_0_keeps_only_known_fields() {
        let anon = RecipientContext::anonymous();
        let out = StandardBadgeClassSerializer
            .serialize(&v1_record(), BadgeClassSchema::V1_0, &ctx(true, None, &anon))
            .unwrap();
        assert!(out.get("unexpected").is_none());
        assert!(out.get("type").is_none());
        assert_eq!(out["tags"], json!(["robots"]));
    }

    #[test]
    fn v1_1_header_depends_on_embedding() {
        let anon = RecipientContext::anonymous();
        let url = Some("https://example.org/badges/robotics");
        let standalone = StandardBadgeClassSerializer
            .serialize(&v1_record(), BadgeClassSchema::V1_1, &ctx(false, url, &anon))
            .unwrap();
        let keys: Vec<&String> = standalone.keys().take(3).collect();
        assert_eq!(keys, ["@context", "type", "id"]);

        let embedded = StandardBadgeClassSerializer
            .serialize(&v1_record(), BadgeClassSchema::V1_1, &ctx(true, url, &anon))
            .unwrap();
        assert!(embedded.get("@context").is_none());
        assert_eq!(embedded["type"], "BadgeClass");
        assert_eq!(embedded["id"], "https://example.org/badges/robotics");
    }

    #[test]
    fn v1_1_requires_an_id() {
        let anon = RecipientContext::anonymous();
        let err = StandardBadgeClassSerializer
            .serialize(&v1_record(), BadgeClassSchema::V1_1, &ctx(true, None, &anon))
            .unwrap_err();
        assert_eq!(err, BadgeClassError::MissingField { field: "id".into() });
    }

    #[test]
    fn v1_1_rejects_wrong_stored_type() {
        let anon = RecipientContext::anonymous();
        let mut rec = v1_record();
        rec.insert("type".into(), json!("Issuer"));
        let err = StandardBadgeClassSerializer
            .serialize(&rec, BadgeClassSchema::V1_1, &ctx(true, Some("https://example.org/b"), &anon))
            .unwrap_err();
        assert!(matches!(err, BadgeClassError::InvalidField { ref field, .. } if field == "type"));
    }

    #[test]
    fn tags_must_be_strings() {
        let anon = RecipientContext::anonymous();
        let mut rec = v1_record();
        rec.insert("tags".into(), json!([1, 2]));
        let err = StandardBadgeClassSerializer
            .serialize(&rec, BadgeClassSchema::V1_0, &ctx(true, None, &anon))
            .unwrap_err();
        assert!(matches!(err, BadgeClassError::InvalidField { ref field, .. } if field == "tags"));
    }

    // ---- Embedder ----

    #[test]
    fn embedded_output_matches_direct_call() {
        let anon = RecipientContext::anonymous();
        let reference = BadgeClassRef::Resolved {
            url: "https://example.org/badges/robotics".into(),
            record: v1_record(),
        };
        let embedded = embed_badge_class(
            Some(&reference),
            BadgeEmbedding::Embed,
            false,
            SpecVersion::V1_1,
            &StandardBadgeClassSerializer,
            &anon,
        )
        .unwrap();
        let direct = StandardBadgeClassSerializer
            .serialize(
                &v1_record(),
                BadgeClassSchema::V1_1,
                &ctx(true, Some("https://example.org/badges/robotics"), &anon),
            )
            .unwrap();
        assert_eq!(embedded, Value::Object(direct));
    }

    #[test]
    fn reference_mode_emits_url() {
        let anon = RecipientContext::anonymous();
        let reference = BadgeClassRef::Url("https://example.org/badges/robotics".into());
        let out = embed_badge_class(
            Some(&reference),
            BadgeEmbedding::Reference,
            false,
            SpecVersion::V1_0,
            &StandardBadgeClassSerializer,
            &anon,
        )
        .unwrap();
        assert_eq!(out, json!("https://example.org/badges/robotics"));
    }

    #[test]
    fn embedded_assertion_forces_embedding() {
        let anon = RecipientContext::anonymous();
        let reference = BadgeClassRef::Url("https://example.org/badges/robotics".into());
        let err = embed_badge_class(
            Some(&reference),
            BadgeEmbedding::Reference,
            true,
            SpecVersion::V1_0,
            &StandardBadgeClassSerializer,
            &anon,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
        assert_eq!(err.field(), Some("badge"));
    }

    #[test]
    fn reference_without_url_is_missing() {
        let anon = RecipientContext::anonymous();
        let reference = BadgeClassRef::Embedded(v0_5_record());
        let err = embed_badge_class(
            Some(&reference),
            BadgeEmbedding::Reference,
            false,
            SpecVersion::V0_5_0,
            &StandardBadgeClassSerializer,
            &anon,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
    }

    #[test]
    fn collaborator_failure_is_invalid_badge() {
        let anon = RecipientContext::anonymous();
        let mut rec = v0_5_record();
        rec.remove("name");
        let err = embed_badge_class(
            Some(&BadgeClassRef::Embedded(rec)),
            BadgeEmbedding::Embed,
            false,
            SpecVersion::V0_5_1,
            &StandardBadgeClassSerializer,
            &anon,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        assert_eq!(err.field(), Some("badge"));
        assert_eq!(err.version(), Some(SpecVersion::V0_5_1));
    }

    #[test]
    fn schema_follows_version() {
        assert_eq!(BadgeClassSchema::from(SpecVersion::V0_5_0), BadgeClassSchema::V0_5);
        assert_eq!(BadgeClassSchema::from(SpecVersion::V0_5_1), BadgeClassSchema::V0_5);
        assert_eq!(BadgeClassSchema::from(SpecVersion::V1_0), BadgeClassSchema::V1_0);
        assert_eq!(BadgeClassSchema::from(SpecVersion::V1_1), BadgeClassSchema::V1_1);
    }
}
