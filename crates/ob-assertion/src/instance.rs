//! # Stored Badge Instances
//!
//! The read-only input of the engine: the raw assertion JSON as it was
//! stored (keys named per the version that produced it), the canonical
//! instance URL, and the badge class the assertion points at.

use serde_json::{Map, Value};

/// Where the badge class of an assertion lives.
#[derive(Debug, Clone, PartialEq)]
pub enum BadgeClassRef {
    /// A badge-class record stored inline with the assertion.
    Embedded(Map<String, Value>),
    /// Only the badge-class URL is known.
    Url(String),
    /// The URL together with the record it resolves to.
    Resolved {
        /// Canonical badge-class URL.
        url: String,
        /// The badge-class record.
        record: Map<String, Value>,
    },
}

impl BadgeClassRef {
    /// Derive a reference from a stored `badge` value: objects are embedded
    /// records, strings are URLs, anything else is no reference.
    pub fn from_stored(value: &Value) -> Option<Self> {
        match value {
            Value::Object(record) => Some(Self::Embedded(record.clone())),
            Value::String(url) => Some(Self::Url(url.clone())),
            _ => None,
        }
    }

    /// The badge-class URL, if one is known.
    ///
    /// An embedded record contributes its own `id` when that is a string.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) | Self::Resolved { url, .. } => Some(url),
            Self::Embedded(record) => record.get("id").and_then(Value::as_str),
        }
    }

    /// The badge-class record, if one is available.
    pub fn record(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Embedded(record) | Self::Resolved { record, .. } => Some(record),
            Self::Url(_) => None,
        }
    }
}

/// A stored badge assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBadgeInstance {
    instance_url: String,
    badge_class: Option<BadgeClassRef>,
    json: Map<String, Value>,
}

impl StoredBadgeInstance {
    /// Wrap stored assertion JSON. The badge-class reference is derived from
    /// the stored `badge` value; use [`with_badge_class`](Self::with_badge_class)
    /// to supply a resolved record.
    pub fn new(instance_url: impl Into<String>, json: Map<String, Value>) -> Self {
        let badge_class = json.get("badge").and_then(BadgeClassRef::from_stored);
        Self {
            instance_url: instance_url.into(),
            badge_class,
            json,
        }
    }

    /// Replace the badge-class reference.
    pub fn with_badge_class(mut self, badge_class: BadgeClassRef) -> Self {
        self.badge_class = Some(badge_class);
        self
    }

    /// Canonical URL of this assertion, emitted as the output `id`.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// The badge-class reference, if any.
    pub fn badge_class(&self) -> Option<&BadgeClassRef> {
        self.badge_class.as_ref()
    }

    /// The raw stored assertion.
    pub fn json(&self) -> &Map<String, Value> {
        &self.json
    }

    /// A raw stored field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.json.get(key)
    }
}
