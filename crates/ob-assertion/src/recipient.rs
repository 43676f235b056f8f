//! # Recipient Resolution
//!
//! Produces the `recipient` sub-document. The resolver never computes a
//! hash: it only chooses how already-hashed or plaintext stored data is
//! represented for the requested version.
//!
//! | Mode | Stored value | Output |
//! |---|---|---|
//! | [`RecipientMode::PlainEmail`] | email | `{recipient, hashed: false, type: "email"}` |
//! | [`RecipientMode::HashOrPlain`] | hash + salt | `{identity, hashed: true, salt}` |
//! | [`RecipientMode::HashOrPlain`] | otherwise | `{identity, hashed: false, type: "email"}` |
//! | [`RecipientMode::Structured`] | object or string | `{identity, hashed, type, salt?}` |
//!
//! ## Disclosure Policy
//!
//! The caller-visible [`RecipientContext`] carries the original identity,
//! never its hash. It is handed to badge-class serializers and is never
//! written into an output document.

use serde_json::{json, Map, Value};
use thiserror::Error;

use ob_core::codec::decode_email;
use ob_core::{FieldCodec, FieldError, HashString, Presence, SerializationError, SpecVersion};

use crate::instance::StoredBadgeInstance;

const DEFAULT_IDENTITY_TYPE: &str = "email";

/// How a version represents its recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientMode {
    /// 0.5.0: plaintext email only.
    PlainEmail,
    /// 0.5.1: hashed (with salt) or plaintext string.
    HashOrPlain,
    /// 1.x: always an identity object.
    Structured,
}

/// Errors constructing a [`RecipientContext`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipientContextError {
    /// The identity is itself a recipient hash.
    #[error("recipient context identity must be the original identity, not a hash: {0:?}")]
    HashedIdentity(String),

    /// The identity is empty or whitespace.
    #[error("recipient context identity must not be blank")]
    Blank,
}

/// The recipient identity disclosed to collaborators for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientContext {
    identity: Option<String>,
}

impl RecipientContext {
    /// No disclosed identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Disclose `identity`.
    ///
    /// # Errors
    ///
    /// Rejects blank and hash-shaped identities.
    pub fn new(identity: impl Into<String>) -> Result<Self, RecipientContextError> {
        let identity = identity.into();
        if identity.trim().is_empty() {
            return Err(RecipientContextError::Blank);
        }
        if HashString::looks_hashed(&identity) {
            return Err(RecipientContextError::HashedIdentity(identity));
        }
        Ok(Self {
            identity: Some(identity),
        })
    }

    /// The disclosed identity, if any.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }
}

/// Build the `recipient` sub-document for `instance`.
pub fn resolve_recipient(
    instance: &StoredBadgeInstance,
    mode: RecipientMode,
    version: SpecVersion,
) -> Result<Value, SerializationError> {
    let stored = match instance.get("recipient") {
        None | Some(Value::Null) => return Err(FieldError::Missing.at("recipient", version)),
        Some(stored) => stored,
    };
    // 0.5.0 has no salt field; only the hashing modes read it.
    let top_level_salt = || decode_salt(instance.get("salt"), "salt", version);

    match (mode, stored) {
        (RecipientMode::PlainEmail, Value::String(raw)) => {
            let email = decode_email(raw).map_err(|e| e.at("recipient", version))?;
            Ok(json!({"recipient": email, "hashed": false, "type": DEFAULT_IDENTITY_TYPE}))
        }
        (RecipientMode::HashOrPlain, Value::String(raw)) => {
            flat_identity(raw, top_level_salt()?, false, version)
        }
        (RecipientMode::Structured, Value::String(raw)) => {
            flat_identity(raw, top_level_salt()?, true, version)
        }
        (RecipientMode::Structured, Value::Object(fields)) => {
            structured_identity(fields, top_level_salt()?, version)
        }
        (_, other) => Err(FieldError::invalid(format!(
            "recipient must be {}, got {other}",
            match mode {
                RecipientMode::Structured => "a string or an identity object",
                _ => "a string",
            }
        ))
        .at("recipient", version)),
    }
}

/// A flat stored identifier: hashed when hash-shaped with a salt, else
/// plaintext email.
fn flat_identity(
    raw: &str,
    salt: Option<String>,
    always_typed: bool,
    version: SpecVersion,
) -> Result<Value, SerializationError> {
    let stored = Value::String(raw.to_string());
    let hashed = FieldCodec::HashString
        .decode(Some(&stored), Presence::Required)
        .ok()
        .flatten();

    let mut out = Map::new();
    match (hashed, salt) {
        (Some(hash), Some(salt)) => {
            out.insert("identity".into(), hash);
            out.insert("hashed".into(), Value::Bool(true));
            if always_typed {
                out.insert("type".into(), Value::String(DEFAULT_IDENTITY_TYPE.into()));
            }
            out.insert("salt".into(), Value::String(salt));
        }
        (Some(hash), None) => {
            out.insert("identity".into(), hash);
            out.insert("hashed".into(), Value::Bool(false));
            out.insert("type".into(), Value::String(DEFAULT_IDENTITY_TYPE.into()));
        }
        (None, _) => {
            let email = decode_email(raw).map_err(|e| e.at("recipient", version))?;
            out.insert("identity".into(), Value::String(email));
            out.insert("hashed".into(), Value::Bool(false));
            out.insert("type".into(), Value::String(DEFAULT_IDENTITY_TYPE.into()));
        }
    }
    Ok(Value::Object(out))
}

/// A 1.x identity object. Explicit `hashed`, `type` and `salt` win over
/// defaults; the object's own salt wins over a top-level one.
fn structured_identity(
    fields: &Map<String, Value>,
    top_level_salt: Option<String>,
    version: SpecVersion,
) -> Result<Value, SerializationError> {
    let identity = FieldCodec::Text
        .decode(fields.get("identity"), Presence::Required)
        .map_err(|e| e.at("recipient.identity", version))?
        .unwrap_or_default();

    let hashed = match fields.get("hashed") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => {
            return Err(FieldError::invalid(format!("hashed must be a boolean, got {other}"))
                .at("recipient.hashed", version))
        }
    };

    let identity_type = FieldCodec::Text
        .decode(fields.get("type"), Presence::Optional)
        .map_err(|e| e.at("recipient.type", version))?
        .unwrap_or_else(|| Value::String(DEFAULT_IDENTITY_TYPE.into()));

    let salt = match decode_salt(fields.get("salt"), "recipient.salt", version)? {
        Some(salt) => Some(salt),
        None => top_level_salt,
    };

    let identity = if hashed {
        FieldCodec::HashString
            .decode(Some(&identity), Presence::Required)
            .map_err(|e| e.at("recipient.identity", version))?
            .unwrap_or(identity)
    } else {
        identity
    };

    let mut out = Map::new();
    out.insert("identity".into(), identity);
    out.insert("hashed".into(), Value::Bool(hashed));
    out.insert("type".into(), identity_type);
    if hashed {
        if let Some(salt) = salt {
            out.insert("salt".into(), Value::String(salt));
        }
    }
    Ok(Value::Object(out))
}

fn decode_salt(
    raw: Option<&Value>,
    field: &str,
    version: SpecVersion,
) -> Result<Option<String>, SerializationError> {
    let salt = FieldCodec::Text
        .decode(raw, Presence::Optional)
        .map_err(|e| e.at(field, version))?;
    Ok(salt.and_then(|v| v.as_str().map(str::to_string)))
}
