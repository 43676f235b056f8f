//! # Structural Schema Check
//!
//! A serialized 1.1 assertion must satisfy the bundled JSON Schema
//! (`schemas/assertion-1.1.schema.json`, draft 7) in addition to term
//! resolution. The schema is compiled once per validator.

use std::fmt;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::ConformanceError;

const ASSERTION_SCHEMA: &str = include_str!("../schemas/assertion-1.1.schema.json");

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the violating value.
    pub instance_path: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// The compiled Open Badges 1.1 assertion schema.
pub struct AssertionSchema {
    validator: Validator,
}

impl fmt::Debug for AssertionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionSchema").finish_non_exhaustive()
    }
}

impl AssertionSchema {
    /// Compile the bundled schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::SchemaBuild`] if the bundled schema is
    /// malformed.
    pub fn bundled() -> Result<Self, ConformanceError> {
        let schema: Value = serde_json::from_str(ASSERTION_SCHEMA)
            .map_err(|e| ConformanceError::SchemaBuild(e.to_string()))?;
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft7);
        let validator = opts
            .build(&schema)
            .map_err(|e| ConformanceError::SchemaBuild(e.to_string()))?;
        Ok(Self { validator })
    }

    /// Every violation of the schema by `instance`, in schema order.
    pub fn violations(&self, instance: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }

    /// Check `instance`, folding every violation into one error.
    pub fn check(&self, instance: &Value) -> Result<(), ConformanceError> {
        let violations = self.violations(instance);
        if violations.is_empty() {
            return Ok(());
        }
        let listing = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Err(ConformanceError::Schema(listing))
    }
}
