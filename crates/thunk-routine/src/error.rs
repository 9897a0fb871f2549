//! Error types for thunk-routine

use thiserror::Error;

use crate::failure::Failure;

/// Result type alias for thunk-routine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core routine error types
#[derive(Error, Debug)]
pub enum Error {
    /// The action does not belong to the expected routine phase
    #[error("Type mismatch: expected action type '{expected}', got '{actual}'")]
    TypeMismatch {
        /// Tag the extractor was looking for
        expected: String,
        /// Tag the action actually carried
        actual: String,
    },

    /// Payload could not be encoded into or decoded from an action
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// The tracked operation failed; the FAILURE action has been dispatched
    #[error("Routine failed: {0}")]
    Failed(Failure),

    /// The invocation was aborted before it settled
    #[error("Routine aborted{}", abort_suffix(.reason))]
    Aborted {
        /// Reason handed to `abort`, if any
        reason: Option<String>,
    },
}

fn abort_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(": {r}"))
        .unwrap_or_default()
}

impl Error {
    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an aborted error
    pub fn aborted(reason: Option<String>) -> Self {
        Self::Aborted { reason }
    }

    /// Whether this error came from an abort
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    /// The failure payload carried by a failed invocation
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Consume the error, keeping only the failure payload
    pub fn into_failure(self) -> Option<Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::type_mismatch("A/SUCCESS", "A/REQUEST");
        assert_eq!(
            err.to_string(),
            "Type mismatch: expected action type 'A/SUCCESS', got 'A/REQUEST'"
        );

        assert_eq!(Error::aborted(None).to_string(), "Routine aborted");
        assert_eq!(
            Error::aborted(Some("user left".into())).to_string(),
            "Routine aborted: user left"
        );
    }

    #[test]
    fn test_failure_accessors() {
        let err = Error::Failed(Failure::new("boom"));
        assert_eq!(err.failure().map(|f| f.message.as_str()), Some("boom"));
        assert!(!err.is_aborted());
        assert!(Error::aborted(None).is_aborted());
        assert!(Error::aborted(None).into_failure().is_none());
    }
}
