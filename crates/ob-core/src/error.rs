//! # Error Types: Structured Serialization Failures
//!
//! Two layers, both derived with `thiserror`:
//!
//! - [`FieldError`] is what a single codec reports. It knows nothing about
//!   which field it was decoding or which version was requested.
//! - [`SerializationError`] is what callers of the engine receive. Every
//!   field-level variant carries the offending field name and the requested
//!   [`SpecVersion`] as structured attributes, so the diagnostic never
//!   depends on parsing a message string.

use std::fmt;

use thiserror::Error;

use crate::version::SpecVersion;

/// Failure reported by a single field codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The field is required but the stored value is absent or `null`.
    #[error("value is required")]
    Missing,

    /// The value does not have the expected syntactic shape.
    #[error("invalid format: {reason}")]
    InvalidFormat {
        /// What was wrong with the value.
        reason: String,
    },

    /// A fixed-literal field holds something other than its constant.
    #[error("expected {expected:?}, got {actual}")]
    ValueMismatch {
        /// The mandated constant.
        expected: String,
        /// The stored value, rendered as JSON.
        actual: String,
    },
}

impl FieldError {
    /// Shorthand for [`FieldError::InvalidFormat`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }

    /// Attach the field name and version, producing a caller-facing error.
    pub fn at(self, field: &str, version: SpecVersion) -> SerializationError {
        let field = field.to_string();
        match self {
            Self::Missing => SerializationError::MissingRequiredField { field, version },
            Self::InvalidFormat { reason } => SerializationError::InvalidFormat {
                field,
                version,
                reason,
            },
            Self::ValueMismatch { expected, actual } => SerializationError::ValueMismatch {
                field,
                version,
                expected,
                actual,
            },
        }
    }
}

/// The kind of a [`SerializationError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value does not match its expected syntactic shape.
    InvalidFormat,
    /// A required field is absent for the requested version.
    MissingRequiredField,
    /// A fixed-literal field does not equal its constant.
    ValueMismatch,
    /// The requested version is outside the supported set.
    UnknownVersion,
    /// The assembled 1.1 document failed JSON-LD conformance.
    ConformanceFailure,
}

impl ErrorKind {
    /// Stable identifier string for logs and API layers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "InvalidFormat",
            Self::MissingRequiredField => "MissingRequiredField",
            Self::ValueMismatch => "ValueMismatch",
            Self::UnknownVersion => "UnknownVersion",
            Self::ConformanceFailure => "ConformanceFailure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error returned by assertion serialization.
///
/// No partial document accompanies any variant: a serialization call either
/// returns a complete document or exactly one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// A field value does not match its expected syntactic shape.
    #[error("Open Badges {version}: field '{field}' has an invalid format: {reason}")]
    InvalidFormat {
        /// Name of the offending stored field.
        field: String,
        /// Requested version.
        version: SpecVersion,
        /// What was wrong with the value.
        reason: String,
    },

    /// A required field is absent for the requested version.
    #[error("Open Badges {version}: required field '{field}' is missing")]
    MissingRequiredField {
        /// Name of the missing stored field.
        field: String,
        /// Requested version.
        version: SpecVersion,
    },

    /// A fixed-literal field does not equal its mandated constant.
    #[error("Open Badges {version}: field '{field}' must be {expected:?}, got {actual}")]
    ValueMismatch {
        /// Name of the offending stored field.
        field: String,
        /// Requested version.
        version: SpecVersion,
        /// The mandated constant.
        expected: String,
        /// The stored value, rendered as JSON.
        actual: String,
    },

    /// The caller asked for a version outside the fixed set.
    ///
    /// This is a configuration error and must not be retried.
    #[error("unknown Open Badges version {0:?}; expected one of 0.5.0, 0.5.1, 1.0, 1.1")]
    UnknownVersion(String),

    /// The assembled document failed JSON-LD conformance validation,
    /// including loader failures and timeouts.
    #[error("Open Badges {version}: conformance failure: {reason}")]
    ConformanceFailure {
        /// Requested version (always 1.1 today).
        version: SpecVersion,
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl SerializationError {
    /// The structured kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            Self::ValueMismatch { .. } => ErrorKind::ValueMismatch,
            Self::UnknownVersion(_) => ErrorKind::UnknownVersion,
            Self::ConformanceFailure { .. } => ErrorKind::ConformanceFailure,
        }
    }

    /// The offending field, when the error is attributable to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidFormat { field, .. }
            | Self::MissingRequiredField { field, .. }
            | Self::ValueMismatch { field, .. } => Some(field),
            Self::UnknownVersion(_) | Self::ConformanceFailure { .. } => None,
        }
    }

    /// The requested version, when one had been resolved.
    pub fn version(&self) -> Option<SpecVersion> {
        match self {
            Self::InvalidFormat { version, .. }
            | Self::MissingRequiredField { version, .. }
            | Self::ValueMismatch { version, .. }
            | Self::ConformanceFailure { version, .. } => Some(*version),
            Self::UnknownVersion(_) => None,
        }
    }
}
