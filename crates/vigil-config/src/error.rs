//! Configuration error types.

use thiserror::Error;

/// Errors raised while building or expanding a configuration snapshot.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A dependency references a host group that does not exist.
    #[error("could not expand non-existing host group '{group}'")]
    UnknownHostGroup {
        /// Name of the missing group.
        group: String,
    },

    /// Two configuration objects share the same natural key.
    #[error("duplicate {kind} definition for key '{key}'")]
    DuplicateKey {
        /// Entity kind name.
        kind: &'static str,
        /// Offending key.
        key: String,
    },

    /// A configuration object is malformed.
    #[error("invalid {kind} '{key}': {message}")]
    Invalid {
        /// Entity kind name.
        kind: &'static str,
        /// Offending key.
        key: String,
        /// What is wrong with it.
        message: String,
    },
}

impl ConfigError {
    /// Creates an unknown host group error.
    pub fn unknown_host_group(group: impl Into<String>) -> Self {
        Self::UnknownHostGroup {
            group: group.into(),
        }
    }

    /// Creates a duplicate key error.
    pub fn duplicate_key(kind: &'static str, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            kind,
            key: key.into(),
        }
    }

    /// Creates an invalid object error.
    pub fn invalid(kind: &'static str, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            kind,
            key: key.into(),
            message: message.into(),
        }
    }
}
