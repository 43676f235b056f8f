//! Conformance validator configuration.
//!
//! Selects the context loader, its deadline and the verdict-cache capacity.
//! Defaults fetch contexts remotely. Override via environment variables or
//! explicit construction for offline use and testing.

use std::str::FromStr;
use std::time::Duration;

/// Default deadline for a single context load.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of cached positive verdicts before the cache is cleared.
pub const DEFAULT_CACHE_ENTRIES: usize = 1024;

/// Which [`DocumentLoader`](crate::DocumentLoader) the validator is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoaderKind {
    /// [`HttpLoader`](crate::HttpLoader).
    #[default]
    Remote,
    /// [`StaticLoader::bundled()`](crate::StaticLoader::bundled).
    Bundled,
}

impl LoaderKind {
    /// The configuration spelling of this loader kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Bundled => "bundled",
        }
    }
}

impl FromStr for LoaderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "bundled" => Ok(Self::Bundled),
            other => Err(ConfigError::UnknownLoader(other.to_string())),
        }
    }
}

/// Configuration for a [`ConformanceValidator`](crate::ConformanceValidator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformanceConfig {
    /// Context loader to use.
    pub loader: LoaderKind,
    /// Deadline for each context load, in seconds.
    pub timeout_secs: u64,
    /// Capacity of the positive-verdict cache.
    pub cache_entries: usize,
}

impl Default for ConformanceConfig {
    fn default() -> Self {
        Self {
            loader: LoaderKind::Remote,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_entries: DEFAULT_CACHE_ENTRIES,
        }
    }
}

impl ConformanceConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `OB_CONTEXT_LOADER`: `remote` or `bundled` (default: `remote`)
    /// - `OB_CONTEXT_TIMEOUT_SECS` (default: 10)
    /// - `OB_CONFORMANCE_CACHE_ENTRIES` (default: 1024)
    pub fn from_env() -> Result<Self, ConfigError> {
        let loader = match std::env::var("OB_CONTEXT_LOADER") {
            Ok(raw) => raw.parse()?,
            Err(_) => LoaderKind::default(),
        };
        Ok(Self {
            loader,
            timeout_secs: env_number("OB_CONTEXT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            cache_entries: env_number("OB_CONFORMANCE_CACHE_ENTRIES", DEFAULT_CACHE_ENTRIES)?,
        })
    }

    /// Offline configuration with the bundled context.
    pub fn bundled() -> Self {
        Self {
            loader: LoaderKind::Bundled,
            ..Self::default()
        }
    }

    /// Per-load deadline as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_number<T: FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `OB_CONTEXT_LOADER` names no known loader.
    #[error("unknown context loader {0:?} (expected: remote, bundled)")]
    UnknownLoader(String),
    /// A numeric variable (name, raw value) does not parse.
    #[error("invalid number for {0}: {1:?}")]
    InvalidNumber(String, String),
}
