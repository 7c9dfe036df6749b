//! Error types for fight configuration loading

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading or validating a fight configuration.  The encounter
/// itself never fails at runtime; only this loading boundary does.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML in {path}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse TOML")]
    Parse(#[from] toml::de::Error),

    #[error("invalid fight configuration: {reason}")]
    Invalid { reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            reason: reason.into(),
        }
    }
}
