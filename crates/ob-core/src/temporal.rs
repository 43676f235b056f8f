//! # Temporal Types: UTC-Only Timestamps
//!
//! Defines `Timestamp`, the normalized form of every date field an
//! assertion carries (`issuedOn`, `expires`).
//!
//! Stored badge data is messy: issuers have published RFC 3339 strings with
//! arbitrary offsets, naive datetimes, bare dates and Unix epoch integers.
//! All of these normalize to one canonical textual form,
//! `YYYY-MM-DDTHH:MM:SSZ`, truncated to seconds. Naive inputs are taken as
//! UTC. Anything else is rejected with [`FieldError::InvalidFormat`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FieldError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::from_utc()`]: from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`]: from any accepted textual form.
/// - [`Timestamp::from_epoch_secs()`]: from Unix epoch seconds.
/// - [`Timestamp::from_json()`]: from a raw stored JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a timestamp from text.
    ///
    /// Accepted, in order:
    /// - RFC 3339 with any offset (converted to UTC);
    /// - naive `YYYY-MM-DDTHH:MM:SS[.fff]`, taken as UTC;
    /// - a bare date `YYYY-MM-DD`, taken as midnight UTC;
    /// - a string of ASCII digits, taken as Unix epoch seconds.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidFormat`] if none of the forms parse.
    pub fn parse(s: &str) -> Result<Self, FieldError> {
        let s = s.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_utc(dt.with_timezone(&Utc)));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self::from_utc(naive.and_utc()));
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(Self(midnight.and_utc()));
            }
        }

        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            let secs: i64 = s
                .parse()
                .map_err(|_| FieldError::invalid(format!("epoch value out of range: {s:?}")))?;
            return Self::from_epoch_secs(secs);
        }

        Err(FieldError::invalid(format!(
            "expected an ISO 8601 datetime or Unix timestamp, got {s:?}"
        )))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, FieldError> {
        let dt = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| FieldError::invalid(format!("invalid Unix timestamp: {secs}")))?;
        Ok(Self(dt))
    }

    /// Decode a raw stored JSON value: a string in any form accepted by
    /// [`Timestamp::parse()`], or an integer number of epoch seconds.
    pub fn from_json(value: &Value) -> Result<Self, FieldError> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => {
                let secs = n.as_i64().ok_or_else(|| {
                    FieldError::invalid(format!("epoch timestamp must be an integer, got {n}"))
                })?;
                Self::from_epoch_secs(secs)
            }
            other => Err(FieldError::invalid(format!(
                "expected a datetime string or epoch integer, got {other}"
            ))),
        }
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as ISO 8601 with Z suffix (e.g., `2020-01-01T00:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
