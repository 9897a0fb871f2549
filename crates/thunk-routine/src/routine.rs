//! Routines: three correlated action types for one async operation
//!
//! Every routine has three actions: REQUEST, SUCCESS and FAILURE. Their type
//! tags are derived from the routine type, e.g. `USER/FETCH` yields
//! `USER/FETCH/REQUEST`, `USER/FETCH/SUCCESS` and `USER/FETCH/FAILURE`.
//!
//! A routine holds no state besides its tags. Classification of an action is
//! exact tag equality; the payload is never inspected to decide the phase.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

use crate::action::{create_action, Action, Payload, Phase};
use crate::failure::Failure;
use crate::{Error, Result};

/// Identity of one class of asynchronous operation
///
/// `P` is the success payload type. It only shapes the typed helpers
/// (`success`, `get_success_payload`); actions themselves are untyped.
pub struct Routine<P = Value> {
    routine_type: String,
    request: String,
    success: String,
    failure: String,
    _payload: PhantomData<fn() -> P>,
}

impl<P> Routine<P> {
    /// Create a routine. The type is not validated; callers keep it unique.
    pub fn new(routine_type: impl Into<String>) -> Self {
        let routine_type = routine_type.into();
        Self {
            request: Phase::Request.tag(&routine_type),
            success: Phase::Success.tag(&routine_type),
            failure: Phase::Failure.tag(&routine_type),
            routine_type,
            _payload: PhantomData,
        }
    }

    /// The routine type, prefix of every generated action type
    pub fn routine_type(&self) -> &str {
        &self.routine_type
    }

    /// Alias of [`Routine::routine_type`]
    #[deprecated(note = "use `routine_type` instead")]
    pub fn action_type(&self) -> &str {
        &self.routine_type
    }

    /// `<routine type>/REQUEST`
    pub fn request_type(&self) -> &str {
        &self.request
    }

    /// `<routine type>/SUCCESS`
    pub fn success_type(&self) -> &str {
        &self.success
    }

    /// `<routine type>/FAILURE`
    pub fn failure_type(&self) -> &str {
        &self.failure
    }

    /// Type tag of the given phase
    pub fn type_for(&self, phase: Phase) -> &str {
        match phase {
            Phase::Request => &self.request,
            Phase::Success => &self.success,
            Phase::Failure => &self.failure,
        }
    }

    /// Request action carrying `payload`
    pub fn request(&self, payload: impl Serialize) -> Result<Action> {
        let payload = serde_json::to_value(payload)?;
        Ok(create_action(self.request.as_str()).create(payload))
    }

    /// Request action without a payload
    pub fn request_empty(&self) -> Action {
        create_action(self.request.as_str()).create(Payload::empty())
    }

    /// Failure action; the creator marks it with `error: true`
    pub fn failure(&self, payload: impl Into<Failure>) -> Action {
        create_action(self.failure.as_str()).create(payload.into())
    }

    /// Whether `action` is this routine's REQUEST action
    pub fn is_request_action(&self, action: &Action) -> bool {
        action.action_type == self.request
    }

    /// Whether `action` is this routine's SUCCESS action
    pub fn is_success_action(&self, action: &Action) -> bool {
        action.action_type == self.success
    }

    /// Whether `action` is this routine's FAILURE action
    pub fn is_failure_action(&self, action: &Action) -> bool {
        action.action_type == self.failure
    }

    /// Phase of `action` within this routine, if it belongs to it
    pub fn phase_of(&self, action: &Action) -> Option<Phase> {
        Phase::ALL
            .into_iter()
            .find(|phase| action.action_type == self.type_for(*phase))
    }

    /// Raw payload of this routine's REQUEST action
    pub fn get_request_payload(&self, action: &Action) -> Result<Value> {
        self.expect_phase(action, Phase::Request)?;
        action.payload.to_value()
    }

    /// Payload of this routine's REQUEST action, decoded as `T`
    pub fn get_request_payload_as<T: DeserializeOwned>(&self, action: &Action) -> Result<T> {
        let value = self.get_request_payload(action)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Payload of this routine's FAILURE action
    pub fn get_failure_payload(&self, action: &Action) -> Result<Failure> {
        self.expect_phase(action, Phase::Failure)?;
        match &action.payload {
            Payload::Error(failure) => Ok(failure.clone()),
            Payload::Value(value) => Ok(serde_json::from_value(value.clone())?),
        }
    }

    fn expect_phase(&self, action: &Action, phase: Phase) -> Result<()> {
        let expected = self.type_for(phase);
        if action.action_type != expected {
            return Err(Error::type_mismatch(expected, action.action_type.as_str()));
        }
        Ok(())
    }
}

impl<P: Serialize> Routine<P> {
    /// Success action carrying `payload`
    pub fn success(&self, payload: &P) -> Result<Action> {
        let payload = serde_json::to_value(payload)?;
        Ok(create_action(self.success.as_str()).create(payload))
    }
}

impl<P: DeserializeOwned> Routine<P> {
    /// Payload of this routine's SUCCESS action, decoded as `P`
    pub fn get_success_payload(&self, action: &Action) -> Result<P> {
        self.expect_phase(action, Phase::Success)?;
        let value = action.payload.to_value()?;
        Ok(serde_json::from_value(value)?)
    }
}

impl<P> Clone for Routine<P> {
    fn clone(&self) -> Self {
        Self {
            routine_type: self.routine_type.clone(),
            request: self.request.clone(),
            success: self.success.clone(),
            failure: self.failure.clone(),
            _payload: PhantomData,
        }
    }
}

impl<P> PartialEq for Routine<P> {
    fn eq(&self, other: &Self) -> bool {
        self.routine_type == other.routine_type
    }
}

impl<P> Eq for Routine<P> {}

impl<P> fmt::Debug for Routine<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routine")
            .field("routine_type", &self.routine_type)
            .finish()
    }
}

/// Helper to create a routine
pub fn create_routine<P>(routine_type: impl Into<String>) -> Routine<P> {
    Routine::new(routine_type)
}
