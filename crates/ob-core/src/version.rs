//! # Assertion Versions: The Closed Set of Open Badges Formats
//!
//! A single `SpecVersion` enum, matched exhaustively wherever behavior
//! differs. Adding a variant forces every version table in the workspace
//! to handle it; parsing anything outside the set is an
//! [`SerializationError::UnknownVersion`] configuration error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SerializationError;

/// The Open Badges JSON-LD context URI shared by 0.5.x and 1.x documents.
pub const OPEN_BADGES_V1_CONTEXT: &str = "https://w3id.org/openbadges/v1";

/// One of the supported Open Badges assertion versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpecVersion {
    /// 0.5.0: plaintext email recipients only.
    #[serde(rename = "0.5.0")]
    V0_5_0,
    /// 0.5.1: adds hashed + salted recipients.
    #[serde(rename = "0.5.1")]
    V0_5_1,
    /// 1.0: uid, verification object, badge referenced by URL.
    #[serde(rename = "1.0")]
    V1_0,
    /// 1.1: JSON-LD with fixed `@context` and conformance validation.
    #[serde(rename = "1.1")]
    V1_1,
}

impl SpecVersion {
    /// Every supported version, oldest first.
    pub const ALL: [SpecVersion; 4] = [Self::V0_5_0, Self::V0_5_1, Self::V1_0, Self::V1_1];

    /// The version string as it appears in requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V0_5_0 => "0.5.0",
            Self::V0_5_1 => "0.5.1",
            Self::V1_0 => "1.0",
            Self::V1_1 => "1.1",
        }
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecVersion {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0.5.0" => Ok(Self::V0_5_0),
            "0.5.1" => Ok(Self::V0_5_1),
            "1.0" => Ok(Self::V1_0),
            "1.1" => Ok(Self::V1_1),
            _ => Err(SerializationError::UnknownVersion(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parse_all_known_versions() {
        for v in SpecVersion::ALL {
            assert_eq!(v.as_str().parse::<SpecVersion>().unwrap(), v);
        }
    }

    #[test]
    fn unknown_version_rejected() {
        for raw in ["2.0", "0.5", "1.0.0", "", "v1.1"] {
            let err = raw.parse::<SpecVersion>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnknownVersion, "input {raw:?}");
        }
    }

    #[test]
    fn serde_uses_version_strings() {
        let json = serde_json::to_string(&SpecVersion::V0_5_1).unwrap();
        assert_eq!(json, "\"0.5.1\"");
        let parsed: SpecVersion = serde_json::from_str("\"1.1\"").unwrap();
        assert_eq!(parsed, SpecVersion::V1_1);
    }

    #[test]
    fn padded_version_rejected_verbatim() {
        for raw in [" 1.1 ", "1.1\n", "\t0.5.0"] {
            assert_eq!(
                raw.parse::<SpecVersion>().unwrap_err(),
                SerializationError::UnknownVersion(raw.to_string())
            );
        }
    }
}
