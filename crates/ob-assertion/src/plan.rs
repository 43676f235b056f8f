//! # Version Plans
//!
//! Each supported version is a static [`VersionPlan`]: an ordered list of
//! [`PlanEntry`] values plus the recipient mode, header rule, badge-class
//! schema and conformance flag. One generic assembly function consumes the
//! plan; nothing is inherited or patched in at runtime.
//!
//! | Version | Header | Recipient | Badge-class schema | Conformance |
//! |---|---|---|---|---|
//! | 0.5.0 | `@context`, `type`, `id` | plain email | 0.5 | no |
//! | 0.5.1 | `@context`, `type`, `id` | hash or plain | 0.5 | no |
//! | 1.0 | `type`, `id` | structured | 1.0 | no |
//! | 1.1 | `@context`, `type`, `id` | structured | 1.1 | yes |
//!
//! `@context` is always suppressed for embedded documents.

use serde_json::Value;

use ob_core::{FieldCodec, Presence, SpecVersion, OPEN_BADGES_V1_CONTEXT};

use crate::badge_class::BadgeClassSchema;
use crate::recipient::RecipientMode;

/// One stored field and how it reaches the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Stored key.
    pub source: &'static str,
    /// Alternative stored key consulted when `source` is absent.
    pub fallback: Option<&'static str>,
    /// Output key, or `None` for write-only fields (validated, never emitted).
    pub output: Option<&'static str>,
    /// Codec validating the stored value.
    pub codec: FieldCodec,
    /// Whether the stored value must be present.
    pub presence: Presence,
}

impl FieldSpec {
    /// A field emitted under its stored name.
    pub const fn emitted(source: &'static str, codec: FieldCodec, presence: Presence) -> Self {
        Self {
            source,
            fallback: None,
            output: Some(source),
            codec,
            presence,
        }
    }

    /// A field validated but never emitted.
    pub const fn write_only(source: &'static str, codec: FieldCodec, presence: Presence) -> Self {
        Self {
            source,
            fallback: None,
            output: None,
            codec,
            presence,
        }
    }

    /// Emit under `output` instead of the stored name.
    pub const fn renamed(mut self, output: &'static str) -> Self {
        self.output = Some(output);
        self
    }

    /// Also accept the stored value under `fallback`.
    pub const fn or_stored_as(mut self, fallback: &'static str) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// True if the field never appears in output.
    pub fn is_write_only(&self) -> bool {
        self.output.is_none()
    }
}

/// One step of a version plan, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanEntry {
    /// A plain field run through its codec.
    Field(FieldSpec),
    /// The `recipient` sub-document.
    Recipient,
    /// The `badge` slot.
    Badge,
}

/// Which header fields precede the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRule {
    /// `@context` (unless embedded), `type`, `id`.
    ContextTypeId,
    /// `type`, `id`.
    TypeId,
}

impl HeaderRule {
    /// Header fields for a document with canonical id `instance_url`.
    pub fn fields(&self, instance_url: &str, embedded: bool) -> Vec<(&'static str, Value)> {
        let mut header = Vec::with_capacity(3);
        if *self == Self::ContextTypeId && !embedded {
            header.push(("@context", Value::String(OPEN_BADGES_V1_CONTEXT.into())));
        }
        header.push(("type", Value::String(ASSERTION_TYPE.into())));
        header.push(("id", Value::String(instance_url.to_string())));
        header
    }
}

/// The `type` literal of every assertion.
pub const ASSERTION_TYPE: &str = "Assertion";

/// Everything that distinguishes one version's output contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionPlan {
    /// The version this plan serializes.
    pub version: SpecVersion,
    /// Body entries in output order.
    pub entries: &'static [PlanEntry],
    /// Recipient representation.
    pub recipient: RecipientMode,
    /// Header construction.
    pub header: HeaderRule,
    /// Badge-class field set.
    pub badge_schema: BadgeClassSchema,
    /// Whether the assembled document must pass JSON-LD conformance.
    pub conformance: bool,
}

impl VersionPlan {
    /// Stored keys that must be present, in plan order, without duplicates.
    pub fn required_fields(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = Vec::new();
        for entry in self.entries {
            let key = match entry {
                PlanEntry::Field(spec) if spec.presence == Presence::Required => spec.source,
                PlanEntry::Field(_) => continue,
                PlanEntry::Recipient => "recipient",
                PlanEntry::Badge => "badge",
            };
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Output keys the body may carry, in order, without duplicates.
    pub fn output_fields(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = Vec::new();
        for entry in self.entries {
            let key = match entry {
                PlanEntry::Field(spec) => spec.output,
                PlanEntry::Recipient => Some("recipient"),
                PlanEntry::Badge => Some("badge"),
            };
            if let Some(key) = key {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

const V0_5_COMMON: [PlanEntry; 3] = [
    PlanEntry::Field(
        FieldSpec::emitted("issued_on", FieldCodec::DateTime, Presence::Optional)
            .renamed("issuedOn")
            .or_stored_as("issuedOn"),
    ),
    PlanEntry::Field(FieldSpec::emitted("expires", FieldCodec::DateTime, Presence::Optional)),
    PlanEntry::Field(FieldSpec::emitted("evidence", FieldCodec::Url, Presence::Optional)),
];

static V0_5_0_ENTRIES: [PlanEntry; 5] = [
    V0_5_COMMON[0],
    V0_5_COMMON[1],
    V0_5_COMMON[2],
    PlanEntry::Recipient,
    PlanEntry::Badge,
];

static V0_5_1_ENTRIES: [PlanEntry; 6] = [
    V0_5_COMMON[0],
    V0_5_COMMON[1],
    V0_5_COMMON[2],
    PlanEntry::Field(FieldSpec::write_only("salt", FieldCodec::Text, Presence::Optional)),
    PlanEntry::Recipient,
    PlanEntry::Badge,
];

const V1_0_BODY: [PlanEntry; 9] = [
    PlanEntry::Field(FieldSpec::emitted("uid", FieldCodec::Text, Presence::Required)),
    PlanEntry::Recipient,
    PlanEntry::Field(FieldSpec::write_only("badge", FieldCodec::Url, Presence::Required)),
    PlanEntry::Field(FieldSpec::emitted("issuedOn", FieldCodec::DateTime, Presence::Required)),
    PlanEntry::Field(FieldSpec::write_only(
        "verify",
        FieldCodec::Verification,
        Presence::Required,
    )),
    PlanEntry::Field(FieldSpec::emitted("image", FieldCodec::ImageUrl, Presence::Optional)),
    PlanEntry::Field(FieldSpec::emitted("expires", FieldCodec::DateTime, Presence::Optional)),
    PlanEntry::Field(FieldSpec::emitted("evidence", FieldCodec::Url, Presence::Optional)),
    PlanEntry::Badge,
];

static V1_0_ENTRIES: [PlanEntry; 9] = V1_0_BODY;

static V1_1_ENTRIES: [PlanEntry; 12] = [
    PlanEntry::Field(FieldSpec::write_only("id", FieldCodec::Url, Presence::Required)),
    PlanEntry::Field(FieldSpec::write_only(
        "type",
        FieldCodec::Literal(ASSERTION_TYPE),
        Presence::Required,
    )),
    PlanEntry::Field(FieldSpec::write_only(
        "@context",
        FieldCodec::Literal(OPEN_BADGES_V1_CONTEXT),
        Presence::Required,
    )),
    V1_0_BODY[0],
    V1_0_BODY[1],
    V1_0_BODY[2],
    V1_0_BODY[3],
    V1_0_BODY[4],
    V1_0_BODY[5],
    V1_0_BODY[6],
    V1_0_BODY[7],
    V1_0_BODY[8],
];

static PLAN_V0_5_0: VersionPlan = VersionPlan {
    version: SpecVersion::V0_5_0,
    entries: &V0_5_0_ENTRIES,
    recipient: RecipientMode::PlainEmail,
    header: HeaderRule::ContextTypeId,
    badge_schema: BadgeClassSchema::V0_5,
    conformance: false,
};

static PLAN_V0_5_1: VersionPlan = VersionPlan {
    version: SpecVersion::V0_5_1,
    entries: &V0_5_1_ENTRIES,
    recipient: RecipientMode::HashOrPlain,
    header: HeaderRule::ContextTypeId,
    badge_schema: BadgeClassSchema::V0_5,
    conformance: false,
};

static PLAN_V1_0: VersionPlan = VersionPlan {
    version: SpecVersion::V1_0,
    entries: &V1_0_ENTRIES,
    recipient: RecipientMode::Structured,
    header: HeaderRule::TypeId,
    badge_schema: BadgeClassSchema::V1_0,
    conformance: false,
};

static PLAN_V1_1: VersionPlan = VersionPlan {
    version: SpecVersion::V1_1,
    entries: &V1_1_ENTRIES,
    recipient: RecipientMode::Structured,
    header: HeaderRule::ContextTypeId,
    badge_schema: BadgeClassSchema::V1_1,
    conformance: true,
};

/// The static plan for `version`.
pub fn plan_for(version: SpecVersion) -> &'static VersionPlan {
    match version {
        SpecVersion::V0_5_0 => &PLAN_V0_5_0,
        SpecVersion::V0_5_1 => &PLAN_V0_5_1,
        SpecVersion::V1_0 => &PLAN_V1_0,
        SpecVersion::V1_1 => &PLAN_V1_1,
    }
}
