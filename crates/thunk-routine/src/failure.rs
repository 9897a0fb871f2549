//! Error payloads carried by FAILURE actions
//!
//! A `Failure` is the value an action creator recognises as an error
//! instance: actions built from it carry `error: true`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name given to failures that don't specify one
pub const DEFAULT_FAILURE_NAME: &str = "Error";

/// Error record used as the payload of FAILURE actions
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{name}: {message}")]
pub struct Failure {
    /// Error class name, `"Error"` unless set
    pub name: String,

    /// Human-readable message
    pub message: String,
}

impl Failure {
    /// Create a failure with the default name
    pub fn new(message: impl Into<String>) -> Self {
        Self::named(DEFAULT_FAILURE_NAME, message)
    }

    /// Create a failure with an explicit error name
    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Capture any error as a failure, keeping its display text
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        Self::new(error.to_string())
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        // Already a failure somewhere in the chain: keep it intact
        if let Some(failure) = error.downcast_ref::<Failure>() {
            return failure.clone();
        }
        Self::new(format!("{error:#}"))
    }
}

impl From<std::io::Error> for Failure {
    fn from(error: std::io::Error) -> Self {
        Self::named("IoError", error.to_string())
    }
}

impl From<serde_json::Error> for Failure {
    fn from(error: serde_json::Error) -> Self {
        Self::named("PayloadError", error.to_string())
    }
}

impl From<crate::Error> for Failure {
    fn from(error: crate::Error) -> Self {
        match error {
            crate::Error::Failed(failure) => failure,
            crate::Error::Payload(e) => e.into(),
            crate::Error::TypeMismatch { .. } => Self::named("TypeError", error.to_string()),
            crate::Error::Aborted { .. } => Self::named("AbortError", error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name() {
        let failure = Failure::new("boom");
        assert_eq!(failure.name, "Error");
        assert_eq!(failure.to_string(), "Error: boom");
    }

    #[test]
    fn test_from_anyhow_keeps_failure() {
        let original = Failure::named("CustomError", "nope");
        let wrapped = anyhow::Error::new(original.clone());
        assert_eq!(Failure::from(wrapped), original);

        let plain = anyhow::anyhow!("disk full");
        assert_eq!(Failure::from(plain), Failure::new("disk full"));
    }

    #[test]
    fn test_from_crate_error() {
        let failed = crate::Error::Failed(Failure::new("x"));
        assert_eq!(Failure::from(failed), Failure::new("x"));

        let mismatch = crate::Error::type_mismatch("A/SUCCESS", "B/SUCCESS");
        assert_eq!(Failure::from(mismatch).name, "TypeError");
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(Failure::new("boom")).unwrap();
        assert_eq!(value, serde_json::json!({ "name": "Error", "message": "boom" }));
    }
}
