//! # Field Codecs
//!
//! Self-contained value transformers applied to raw stored assertion
//! fields before anything is written to an output document.
//!
//! Every codec obeys the same presence contract:
//!
//! | stored value | `Presence::Optional` | `Presence::Required` |
//! |---|---|---|
//! | absent or `null` | `Ok(None)` (key omitted) | `Err(FieldError::Missing)` |
//! | present, valid | `Ok(Some(normalized))` | `Ok(Some(normalized))` |
//! | present, invalid | `Err(..)` | `Err(..)` |

use serde_json::{json, Value};
use url::Url;

use crate::error::FieldError;
use crate::hash::HashString;
use crate::temporal::Timestamp;

/// URL schemes accepted by the URL codec.
const ALLOWED_URL_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

/// Verification types accepted in a 1.x `verify` object.
const VERIFICATION_TYPES: [&str; 2] = ["hosted", "signed"];

/// Whether a field must be present for the requested version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    /// Absence is a hard validation failure.
    Required,
    /// Absence omits the key from the output.
    Optional,
}

/// A field codec. Each variant validates and normalizes one kind of value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCodec {
    /// ISO 8601-like timestamp or epoch integer → `YYYY-MM-DDTHH:MM:SSZ`.
    DateTime,
    /// Absolute http(s)/ftp(s) URL.
    Url,
    /// Absolute URL or `data:image/...` URI.
    ImageUrl,
    /// Non-blank string.
    Text,
    /// Plaintext email address.
    Email,
    /// `method$hexdigest` recipient hash.
    HashString,
    /// Value must equal the given constant string.
    Literal(&'static str),
    /// 1.x verification object `{type: hosted|signed, url}`.
    Verification,
}

impl FieldCodec {
    /// Validate `raw` against this codec and the presence rule.
    pub fn decode(&self, raw: Option<&Value>, presence: Presence) -> Result<Option<Value>, FieldError> {
        let value = match raw {
            None | Some(Value::Null) => {
                return match presence {
                    Presence::Required => Err(FieldError::Missing),
                    Presence::Optional => Ok(None),
                };
            }
            Some(value) => value,
        };

        let decoded = match self {
            Self::DateTime => Value::String(Timestamp::from_json(value)?.to_iso8601()),
            Self::Url => Value::String(decode_url(expect_str(value)?)?),
            Self::ImageUrl => Value::String(decode_image_url(expect_str(value)?)?),
            Self::Text => Value::String(decode_text(expect_str(value)?)?),
            Self::Email => Value::String(decode_email(expect_str(value)?)?),
            Self::HashString => {
                Value::String(HashString::parse(expect_str(value)?)?.as_str().to_string())
            }
            Self::Literal(expected) => decode_literal(value, expected)?,
            Self::Verification => decode_verification(value)?,
        };

        Ok(Some(decoded))
    }
}

fn expect_str(value: &Value) -> Result<&str, FieldError> {
    value
        .as_str()
        .ok_or_else(|| FieldError::invalid(format!("expected a string, got {value}")))
}

/// Validate an absolute URL with an allowed scheme. The input text is
/// returned unchanged so issuers' URLs round-trip byte-for-byte.
pub fn decode_url(s: &str) -> Result<String, FieldError> {
    let trimmed = s.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|e| FieldError::invalid(format!("{trimmed:?} is not an absolute URL: {e}")))?;

    if !ALLOWED_URL_SCHEMES.contains(&parsed.scheme()) {
        return Err(FieldError::invalid(format!(
            "URL scheme {:?} is not allowed in {trimmed:?}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(FieldError::invalid(format!("URL {trimmed:?} has no host")));
    }

    Ok(trimmed.to_string())
}

fn decode_image_url(s: &str) -> Result<String, FieldError> {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("data:") {
        return if rest.starts_with("image/") && rest.contains(',') {
            Ok(trimmed.to_string())
        } else {
            Err(FieldError::invalid("data URI must carry an image/* payload"))
        };
    }
    decode_url(trimmed)
}

fn decode_text(s: &str) -> Result<String, FieldError> {
    if s.trim().is_empty() {
        return Err(FieldError::invalid("string must not be blank"));
    }
    Ok(s.to_string())
}

/// Validate a plaintext email address: one `@`, a non-empty local part,
/// a dotted domain, no whitespace.
pub fn decode_email(s: &str) -> Result<String, FieldError> {
    let trimmed = s.trim();
    let invalid = || FieldError::invalid(format!("{trimmed:?} is not a valid email address"));

    if trimmed.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = trimmed.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }

    Ok(trimmed.to_string())
}

fn decode_literal(value: &Value, expected: &str) -> Result<Value, FieldError> {
    match value.as_str() {
        Some(s) if s == expected => Ok(Value::String(expected.to_string())),
        _ => Err(FieldError::ValueMismatch {
            expected: expected.to_string(),
            actual: value.to_string(),
        }),
    }
}

fn decode_verification(value: &Value) -> Result<Value, FieldError> {
    let obj = value
        .as_object()
        .ok_or_else(|| FieldError::invalid(format!("verification must be an object, got {value}")))?;

    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| FieldError::invalid("verification object has no type"))?;
    if !VERIFICATION_TYPES.contains(&kind) {
        return Err(FieldError::invalid(format!(
            "verification type must be hosted or signed, got {kind:?}"
        )));
    }

    let url = obj
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| FieldError::invalid("verification object has no url"))?;
    let url = decode_url(url)?;

    Ok(json!({ "type": kind, "url": url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ok(codec: FieldCodec, raw: Value) -> Value {
        codec
            .decode(Some(&raw), Presence::Required)
            .unwrap()
            .expect("present value decodes to Some")
    }

    fn err(codec: FieldCodec, raw: Value) -> FieldError {
        codec.decode(Some(&raw), Presence::Required).unwrap_err()
    }

    // ---- presence contract ----

    #[test]
    fn absent_optional_is_omitted() {
        assert_eq!(FieldCodec::Url.decode(None, Presence::Optional), Ok(None));
        assert_eq!(
            FieldCodec::DateTime.decode(Some(&Value::Null), Presence::Optional),
            Ok(None)
        );
    }

    #[test]
    fn absent_required_is_missing() {
        assert_eq!(
            FieldCodec::Text.decode(None, Presence::Required),
            Err(FieldError::Missing)
        );
        assert_eq!(
            FieldCodec::Verification.decode(Some(&Value::Null), Presence::Required),
            Err(FieldError::Missing)
        );
    }

    #[test]
    fn invalid_optional_still_fails() {
        let raw = json!("nope");
        assert!(FieldCodec::Url.decode(Some(&raw), Presence::Optional).is_err());
    }

    // ---- date/time ----

    #[test]
    fn datetime_normalizes() {
        assert_eq!(ok(FieldCodec::DateTime, json!("2020-01-01T00:00:00Z")), json!("2020-01-01T00:00:00Z"));
        assert_eq!(ok(FieldCodec::DateTime, json!(1577836800)), json!("2020-01-01T00:00:00Z"));
        assert!(matches!(err(FieldCodec::DateTime, json!("yesterday")), FieldError::InvalidFormat { .. }));
    }

    // ---- URLs ----

    #[test]
    fn url_requires_absolute() {
        assert_eq!(ok(FieldCodec::Url, json!("https://example.org/a/1")), json!("https://example.org/a/1"));
        for bad in ["/a/1", "example.org/a", "mailto:a@example.org", "javascript:alert(1)", "https://"] {
            assert!(
                matches!(err(FieldCodec::Url, json!(bad)), FieldError::InvalidFormat { .. }),
                "input {bad:?}"
            );
        }
        assert!(matches!(err(FieldCodec::Url, json!(42)), FieldError::InvalidFormat { .. }));
    }

    #[test]
    fn image_url_accepts_data_uri() {
        let data = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(ok(FieldCodec::ImageUrl, json!(data)), json!(data));
        assert_eq!(ok(FieldCodec::ImageUrl, json!("https://example.org/i.png")), json!("https://example.org/i.png"));
        assert!(FieldCodec::ImageUrl.decode(Some(&json!("data:text/plain,hi")), Presence::Required).is_err());
    }

    // ---- strings ----

    #[test]
    fn text_rejects_blank() {
        assert_eq!(ok(FieldCodec::Text, json!("abc-123")), json!("abc-123"));
        assert!(matches!(err(FieldCodec::Text, json!("   ")), FieldError::InvalidFormat { .. }));
    }

    #[test]
    fn email_shape() {
        assert_eq!(ok(FieldCodec::Email, json!("alice@example.org")), json!("alice@example.org"));
        for bad in ["alice", "alice@", "@example.org", "alice@example", "a b@example.org", "a@b@example.org", "alice@example..org"] {
            assert!(FieldCodec::Email.decode(Some(&json!(bad)), Presence::Required).is_err(), "input {bad:?}");
        }
    }

    // ---- literals ----

    #[test]
    fn literal_mismatch() {
        let codec = FieldCodec::Literal("Assertion");
        assert_eq!(ok(codec, json!("Assertion")), json!("Assertion"));
        assert_eq!(
            err(codec, json!("BadgeClass")),
            FieldError::ValueMismatch {
                expected: "Assertion".into(),
                actual: "\"BadgeClass\"".into(),
            }
        );
        assert!(matches!(err(codec, json!(["Assertion"])), FieldError::ValueMismatch { .. }));
    }

    // ---- hash strings ----

    #[test]
    fn hash_string_shape() {
        assert_eq!(ok(FieldCodec::HashString, json!("sha256$abc123")), json!("sha256$abc123"));
        assert!(matches!(err(FieldCodec::HashString, json!("alice@example.org")), FieldError::InvalidFormat { .. }));
    }

    // ---- verification ----

    #[test]
    fn verification_object() {
        let v = ok(FieldCodec::Verification, json!({"type": "hosted", "url": "https://example.org/a/1", "extra": 1}));
        assert_eq!(v, json!({"type": "hosted", "url": "https://example.org/a/1"}));

        assert!(FieldCodec::Verification.decode(Some(&json!({"type": "magic", "url": "https://example.org"})), Presence::Required).is_err());
        assert!(FieldCodec::Verification.decode(Some(&json!({"type": "signed"})), Presence::Required).is_err());
        assert!(FieldCodec::Verification.decode(Some(&json!("hosted")), Presence::Required).is_err());
    }

    proptest! {
        #[test]
        fn arbitrary_text_never_panics(s in ".*") {
            let raw = Value::String(s);
            for codec in [
                FieldCodec::DateTime,
                FieldCodec::Url,
                FieldCodec::ImageUrl,
                FieldCodec::Text,
                FieldCodec::Email,
                FieldCodec::HashString,
                FieldCodec::Literal("Assertion"),
                FieldCodec::Verification,
            ] {
                let _ = codec.decode(Some(&raw), Presence::Optional);
            }
        }

        #[test]
        fn hex_digests_accepted(digest in "[0-9a-f]{1,128}") {
            let raw = json!(format!("sha256${digest}"));
            prop_assert_eq!(FieldCodec::HashString.decode(Some(&raw), Presence::Required).unwrap(), Some(raw.clone()));
        }
    }
}
