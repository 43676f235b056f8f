#![deny(missing_docs)]

//! # ob-assertion: Versioned Open Badges Assertion Serialization
//!
//! Turns a [`StoredBadgeInstance`] into the public JSON document for one of
//! the four supported Open Badges versions.
//!
//! ## Architecture
//!
//! - [`plan`]: one static [`VersionPlan`] per version: fields, recipient
//!   mode, header rule, badge-class schema, conformance flag.
//! - [`recipient`]: plaintext vs. hashed recipient representation.
//! - [`badge_class`]: the badge-class collaborator trait, its standard
//!   implementation and the embed-or-reference decision.
//! - [`serializer`]: the generic assembly function and the async entry
//!   point, which hands 1.1 documents to `ob-conformance`.
//!
//! ## Crate Policy
//!
//! - A call returns a complete document or exactly one
//!   [`SerializationError`](ob_core::SerializationError). Never both.
//! - Hashes are never computed here. Stored hashes are only represented.
//! - The caller-disclosed recipient identity never reaches an output document.

pub mod badge_class;
pub mod instance;
pub mod plan;
pub mod recipient;
pub mod serializer;

pub use badge_class::{
    BadgeClassContext, BadgeClassError, BadgeClassSchema, BadgeClassSerializer, BadgeEmbedding,
    StandardBadgeClassSerializer,
};
pub use instance::{BadgeClassRef, StoredBadgeInstance};
pub use plan::{plan_for, FieldSpec, HeaderRule, PlanEntry, VersionPlan};
pub use recipient::{RecipientContext, RecipientContextError, RecipientMode};
pub use serializer::{AssertionSerializer, Document, SerializeOptions};
