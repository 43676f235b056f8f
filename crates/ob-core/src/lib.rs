#![deny(missing_docs)]

//! # ob-core: Foundational Types for the Open Badges Assertion Engine
//!
//! This crate is the leaf of the workspace. It defines the primitives every
//! other crate relies on to keep versioned serialization honest:
//!
//! 1. **A closed version set.** [`SpecVersion`] has exactly four variants and
//!    is matched exhaustively. An unrecognized version string is a
//!    configuration error, never a data error.
//!
//! 2. **Structured errors.** [`SerializationError`] always carries its kind,
//!    the offending field and the requested version as attributes.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] normalizes every accepted date
//!    form to `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! 4. **Field codecs.** [`FieldCodec`] validates one raw stored value under a
//!    [`Presence`] rule; absent optional values vanish, absent required values
//!    fail before any output exists.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ob-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod codec;
pub mod error;
pub mod hash;
pub mod temporal;
pub mod version;

// Re-export primary types for ergonomic imports.
pub use codec::{FieldCodec, Presence};
pub use error::{ErrorKind, FieldError, SerializationError};
pub use hash::{HashMethod, HashString};
pub use temporal::Timestamp;
pub use version::{SpecVersion, OPEN_BADGES_V1_CONTEXT};
