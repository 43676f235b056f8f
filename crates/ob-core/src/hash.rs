//! # Hashed Recipient Identities
//!
//! Open Badges lets an issuer publish a salted digest of the recipient's
//! identity instead of the identity itself, written as `method$hexdigest`
//! (e.g. `sha256$c7ef86...`). This module only recognizes that shape; it
//! never computes a digest. Hash computation belongs to whoever verifies the
//! recipient out-of-band.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// The digest algorithm named in the `method` half of a hash string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMethod {
    /// MD5 (legacy 0.5 badges).
    Md5,
    /// SHA-1.
    Sha1,
    /// SHA-256, the common case.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl HashMethod {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashMethod {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            other => Err(FieldError::invalid(format!("unsupported hash method {other:?}"))),
        }
    }
}

/// A validated `method$hexdigest` recipient hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashString {
    method: HashMethod,
    raw: String,
}

impl HashString {
    /// Parse a hash string, rejecting anything not shaped `method$hexdigest`.
    ///
    /// The original text is kept verbatim so it can be echoed back unchanged.
    pub fn parse(s: &str) -> Result<Self, FieldError> {
        let (method, digest) = s
            .split_once('$')
            .ok_or_else(|| FieldError::invalid(format!("expected method$hexdigest, got {s:?}")))?;

        let method: HashMethod = method.parse()?;

        if digest.is_empty() || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FieldError::invalid(format!(
                "digest part of {s:?} must be non-empty hexadecimal"
            )));
        }

        Ok(Self {
            method,
            raw: s.to_string(),
        })
    }

    /// True if `s` has the shape of a recipient hash.
    pub fn looks_hashed(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// The digest algorithm.
    pub fn method(&self) -> HashMethod {
        self.method
    }

    /// The hex digest, without the method prefix.
    pub fn digest(&self) -> &str {
        self.raw
            .split_once('$')
            .map(|(_, digest)| digest)
            .unwrap_or_default()
    }

    /// The full `method$hexdigest` text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for HashString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sha256() {
        let h = HashString::parse("sha256$abc123").unwrap();
        assert_eq!(h.method(), HashMethod::Sha256);
        assert_eq!(h.digest(), "abc123");
        assert_eq!(h.as_str(), "sha256$abc123");
    }

    #[test]
    fn method_is_case_insensitive_and_preserved() {
        let h = HashString::parse("SHA1$DEADBEEF").unwrap();
        assert_eq!(h.method(), HashMethod::Sha1);
        assert_eq!(h.to_string(), "SHA1$DEADBEEF");
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "abc123",
            "sha256$",
            "$abc",
            "sha256$xyz",
            "whirlpool$abc",
            "alice@example.org",
            "sha256$ab$cd",
        ] {
            assert!(!HashString::looks_hashed(bad), "input {bad:?}");
        }
    }

    #[test]
    fn method_display_roundtrip() {
        for m in [
            HashMethod::Md5,
            HashMethod::Sha1,
            HashMethod::Sha256,
            HashMethod::Sha384,
            HashMethod::Sha512,
        ] {
            assert_eq!(m.to_string().parse::<HashMethod>().unwrap(), m);
        }
    }
}
