#![deny(missing_docs)]

//! # ob-conformance: JSON-LD Conformance for Open Badges 1.1
//!
//! A serialized 1.1 assertion is only accepted when it is meaningful
//! linked data: every term it uses must map to an IRI under the contexts it
//! declares. This crate answers that question.
//!
//! - [`DocumentLoader`] fetches context documents. [`StaticLoader`] serves
//!   the bundled Open Badges v1 context offline; [`HttpLoader`] fetches
//!   remotely.
//! - [`AssertionSchema`] adds a structural check with the bundled draft 7
//!   schema.
//! - [`ConformanceValidator`] expands the document with the `json-ld`
//!   processor and reports every term the expansion drops or cannot map.
//!   Context loads are bounded by a timeout, and contexts and positive
//!   verdicts are cached.
//!
//! ## Crate Policy
//!
//! - Loader failures and timeouts reject the document. There are no retries.
//! - Only successful loads and positive verdicts are cached.

pub mod config;
pub mod error;
mod expansion;
pub mod loader;
pub mod schema;
pub mod validator;

pub use config::{ConfigError, ConformanceConfig, LoaderKind};
pub use error::{ConformanceError, LoaderError};
pub use loader::{DocumentLoader, HttpLoader, StaticLoader};
pub use schema::{AssertionSchema, Violation};
pub use validator::{ConformanceValidator, MAX_CONTEXT_LOADS};
