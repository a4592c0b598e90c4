//! Engine error types.

use thiserror::Error;
use vigil_config::ConfigError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while applying configuration to the runtime graph.
///
/// Appliers fail fast: the first error aborts the whole reconfiguration
/// cycle, and nothing applied so far is rolled back. The caller decides
/// whether to keep running on the previous in-memory state.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A configuration object is malformed, references a non-existent
    /// entity, or violates an identity rule.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description naming the offending key.
        message: String,
    },

    /// A runtime object expected to exist by key is missing. This is a bug
    /// in graph maintenance, not a user configuration problem.
    #[error("internal consistency error: {message}")]
    InternalConsistency {
        /// Description naming the missing key.
        message: String,
    },

    /// A resolve step detected a cross-object problem, such as a
    /// dependency cycle.
    #[error("validation error: {message}")]
    Validation {
        /// Description naming at least one involved object.
        message: String,
    },
}

impl EngineError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an internal consistency error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalConsistency {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = EngineError::configuration("cannot modify non-existing host 'web-1'");
        assert!(err.to_string().contains("web-1"));

        let err: EngineError = ConfigError::unknown_host_group("frontends").into();
        assert!(matches!(err, EngineError::Configuration { .. }));
        assert!(err.to_string().contains("frontends"));
    }
}
