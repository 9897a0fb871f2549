//! Deprecated one-shot dispatch helpers
//!
//! Kept for callers written against the executor-based API. New code should
//! build a [`Thunk`](crate::thunk::Thunk) with
//! [`create_thunk`](crate::thunk::create_thunk), which adds async hooks and
//! cancellation.

#![allow(deprecated)]

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::debug;

use crate::action::{create_action, Action};
use crate::dispatch::Dispatch;
use crate::failure::Failure;
use crate::routine::Routine;
use crate::{Error, Result};

/// Deferred success payload computation
pub type SuccessPayloadFn<P> =
    Box<dyn FnOnce() -> BoxFuture<'static, std::result::Result<P, Failure>> + Send>;

/// Work handed to [`dispatch_routine`]
#[deprecated(note = "use `create_thunk` instead")]
pub enum Executor<P> {
    /// Only computes the success payload; REQUEST carries no payload
    Plain(SuccessPayloadFn<P>),
    /// Success computation plus synchronous payload hooks
    Composed(ComposedExecutor<P>),
}

impl<P: 'static> Executor<P> {
    /// Executor from a plain async function
    pub fn plain<F, Fut, E>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<P, E>> + Send + 'static,
        E: Into<Failure>,
    {
        Self::Plain(boxed_success(f))
    }
}

impl<P> From<ComposedExecutor<P>> for Executor<P> {
    fn from(executor: ComposedExecutor<P>) -> Self {
        Self::Composed(executor)
    }
}

/// Success computation with optional synchronous payload hooks
#[deprecated(note = "use `create_thunk` with `ThunkOptions` instead")]
pub struct ComposedExecutor<P> {
    request_payload: Option<Box<dyn FnOnce() -> Value + Send>>,
    success_payload: SuccessPayloadFn<P>,
    failure_payload: Option<Box<dyn FnOnce(Failure) -> Failure + Send>>,
}

impl<P: 'static> ComposedExecutor<P> {
    /// Composed executor around the success computation
    pub fn new<F, Fut, E>(get_success_payload: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<P, E>> + Send + 'static,
        E: Into<Failure>,
    {
        Self {
            request_payload: None,
            success_payload: boxed_success(get_success_payload),
            failure_payload: None,
        }
    }

    /// Payload for the REQUEST action
    pub fn with_request_payload<F>(mut self, get_request_payload: F) -> Self
    where
        F: FnOnce() -> Value + Send + 'static,
    {
        self.request_payload = Some(Box::new(get_request_payload));
        self
    }

    /// Replace the raw failure before it is dispatched
    pub fn with_failure_payload<F>(mut self, get_failure_payload: F) -> Self
    where
        F: FnOnce(Failure) -> Failure + Send + 'static,
    {
        self.failure_payload = Some(Box::new(get_failure_payload));
        self
    }
}

fn boxed_success<P, F, Fut, E>(f: F) -> SuccessPayloadFn<P>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = std::result::Result<P, E>> + Send + 'static,
    E: Into<Failure>,
{
    Box::new(move || {
        let fut = f();
        Box::pin(async move { fut.await.map_err(Into::<Failure>::into) })
            as BoxFuture<'static, std::result::Result<P, Failure>>
    })
}

/// Dispatch REQUEST, run the executor, then dispatch SUCCESS or FAILURE
#[deprecated(note = "use `create_thunk` instead")]
pub async fn dispatch_routine<D, P>(
    dispatch: &D,
    routine: &Routine<P>,
    executor: Executor<P>,
) -> Result<D::Output>
where
    D: Dispatch + ?Sized,
    P: Serialize,
{
    let (request_payload, success_payload, failure_payload) = match executor {
        Executor::Plain(f) => (None, f, None),
        Executor::Composed(composed) => (
            composed.request_payload.map(|f| f()),
            composed.success_payload,
            composed.failure_payload,
        ),
    };

    let request = match request_payload {
        Some(payload) => create_action(routine.request_type()).create(payload),
        None => routine.request_empty(),
    };
    debug!("Dispatching {}", request.action_type);
    dispatch.dispatch(request).await;

    let failure = match success_payload().await {
        Ok(payload) => match routine.success(&payload) {
            Ok(action) => {
                debug!("Dispatching {}", action.action_type);
                return Ok(dispatch.dispatch(action).await);
            }
            Err(e) => e.into(),
        },
        Err(failure) => failure,
    };

    let failure = match failure_payload {
        Some(hook) => hook(failure),
        None => failure,
    };

    debug!("Dispatching {}", routine.failure_type());
    dispatch.dispatch(routine.failure(failure.clone())).await;
    Err(Error::Failed(failure))
}

/// Decode the payload of an action without checking its type
#[deprecated(note = "use `Routine::get_success_payload` instead")]
pub fn get_typed_payload<P: DeserializeOwned>(_routine: &Routine<P>, action: &Action) -> Result<P> {
    Ok(serde_json::from_value(action.payload.to_value()?)?)
}

/// Read the failure carried by an action without checking its type
#[deprecated(note = "use `Routine::get_failure_payload` instead")]
pub fn get_typed_error<P>(_routine: &Routine<P>, action: &Action) -> Result<Failure> {
    match action.payload.as_failure() {
        Some(failure) => Ok(failure.clone()),
        None => Ok(serde_json::from_value(action.payload.to_value()?)?),
    }
}
