//! Actions and the action creator
//!
//! An action is a plain `{type, payload, error}` record describing one state
//! transition. Actions are built through an [`ActionCreator`], which marks
//! the action with `error: true` when its payload is a [`Failure`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::failure::Failure;

/// One of the three stages of a tracked asynchronous operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// The operation has started
    Request,
    /// The operation completed with a result
    Success,
    /// The operation failed
    Failure,
}

impl Phase {
    /// All phases, in dispatch order
    pub const ALL: [Phase; 3] = [Phase::Request, Phase::Success, Phase::Failure];

    /// Suffix appended to a routine type to form this phase's tag
    pub fn suffix(self) -> &'static str {
        match self {
            Phase::Request => "REQUEST",
            Phase::Success => "SUCCESS",
            Phase::Failure => "FAILURE",
        }
    }

    /// Build the action type tag for `routine_type` in this phase
    pub fn tag(self, routine_type: &str) -> String {
        format!("{}/{}", routine_type, self.suffix())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Payload carried by an action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Arbitrary data; `Null` means the action has no payload
    Value(Value),
    /// An error instance
    Error(Failure),
}

impl Payload {
    /// Payload of an action created without one
    pub fn empty() -> Self {
        Self::Value(Value::Null)
    }

    /// Whether the action was created without a payload
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    /// Whether this payload is an error instance
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The data value, if this is not an error payload
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    /// The failure, if this is an error payload
    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Error(failure) => Some(failure),
            Self::Value(_) => None,
        }
    }

    /// Convert the payload into a JSON value
    pub fn to_value(&self) -> crate::Result<Value> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Error(failure) => Ok(serde_json::to_value(failure)?),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Failure> for Payload {
    fn from(failure: Failure) -> Self {
        Self::Error(failure)
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Self::empty()
    }
}

/// A dispatched state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAction")]
pub struct Action {
    /// Action type tag
    #[serde(rename = "type")]
    pub action_type: String,

    /// Action payload, omitted when empty
    #[serde(skip_serializing_if = "Payload::is_empty")]
    pub payload: Payload,

    /// Set when the payload is an error instance
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl Action {
    /// Build an action the same way an [`ActionCreator`] does
    pub fn new(action_type: impl Into<String>, payload: impl Into<Payload>) -> Self {
        let payload = payload.into();
        Self {
            action_type: action_type.into(),
            error: payload.is_error(),
            payload,
        }
    }

    /// The action's type tag
    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    /// The action's payload
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Whether the action is marked as an error
    pub fn is_error(&self) -> bool {
        self.error
    }
}

/// Wire shape used to read actions back in
#[derive(Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    action_type: String,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    error: bool,
}

impl From<RawAction> for Action {
    fn from(raw: RawAction) -> Self {
        let payload = if raw.error {
            match serde_json::from_value::<Failure>(raw.payload.clone()) {
                Ok(failure) => Payload::Error(failure),
                Err(_) => Payload::Value(raw.payload),
            }
        } else {
            Payload::Value(raw.payload)
        };

        Self {
            action_type: raw.action_type,
            payload,
            error: raw.error,
        }
    }
}

/// Curried action constructor bound to one type tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCreator {
    tag: String,
}

impl ActionCreator {
    /// The tag every created action carries
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Create an action with the given payload
    pub fn create(&self, payload: impl Into<Payload>) -> Action {
        Action::new(self.tag.clone(), payload)
    }
}

/// Create an action creator for `tag`
pub fn create_action(tag: impl Into<String>) -> ActionCreator {
    ActionCreator { tag: tag.into() }
}
