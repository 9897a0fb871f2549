//! Thunk execution driver
//!
//! A [`Thunk`] ties a [`Routine`] to the computation whose lifecycle it
//! tracks. Each invocation dispatches the routine's REQUEST action, runs the
//! computation, then dispatches exactly one of SUCCESS or FAILURE:
//!
//! 1. resolve the request payload (hook, else the invocation args)
//! 2. dispatch REQUEST and wait for it
//! 3. run the computation
//! 4. on success dispatch SUCCESS; the dispatcher's output is the result
//! 5. on failure resolve the failure payload (hook, else the failure itself),
//!    dispatch FAILURE and return `Error::Failed`
//!
//! Invocations share nothing but the thunk's immutable parts, so any number
//! of them may run concurrently against the same routine.

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::abort::{AbortSignal, Cancellable};
use crate::action::{create_action, Action, Payload};
use crate::dispatch::Dispatch;
use crate::failure::Failure;
use crate::routine::Routine;
use crate::{Error, Result};

type HookResult<T> = std::result::Result<T, Failure>;

/// Success payload computation
pub type ComputeFn<A, P> = Arc<dyn Fn(A) -> BoxFuture<'static, HookResult<P>> + Send + Sync>;

/// Hook replacing the invocation args as the REQUEST payload
pub type RequestPayloadFn<A> = Arc<dyn Fn(A) -> BoxFuture<'static, HookResult<Value>> + Send + Sync>;

/// Hook replacing the caught failure as the FAILURE payload
pub type FailurePayloadFn =
    Arc<dyn Fn(Failure) -> BoxFuture<'static, HookResult<Failure>> + Send + Sync>;

/// Optional payload overrides for a thunk
pub struct ThunkOptions<A> {
    request_payload: Option<RequestPayloadFn<A>>,
    failure_payload: Option<FailurePayloadFn>,
}

impl<A> ThunkOptions<A> {
    /// Options with no overrides
    pub fn new() -> Self {
        Self {
            request_payload: None,
            failure_payload: None,
        }
    }

    /// Compute the REQUEST payload from the args instead of using them as-is
    ///
    /// An error from the hook is treated like a failure of the computation.
    pub fn with_request_payload<F, Fut, R, E>(mut self, hook: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
        R: Serialize,
        E: Into<Failure>,
    {
        self.request_payload = Some(Arc::new(move |args| {
            let fut = hook(args);
            Box::pin(async move {
                fut.await
                    .map_err(Into::<Failure>::into)
                    .and_then(|payload| serde_json::to_value(payload).map_err(Failure::from))
            }) as BoxFuture<'static, HookResult<Value>>
        }));
        self
    }

    /// Transform the caught failure before it is dispatched and returned
    ///
    /// If the hook itself fails, the original failure is used instead.
    pub fn with_failure_payload<F, Fut, E>(mut self, hook: F) -> Self
    where
        F: Fn(Failure) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Failure, E>> + Send + 'static,
        E: Into<Failure>,
    {
        self.failure_payload = Some(Arc::new(move |failure| {
            let fut = hook(failure);
            Box::pin(async move { fut.await.map_err(Into::<Failure>::into) })
                as BoxFuture<'static, HookResult<Failure>>
        }));
        self
    }

    /// Whether a request payload hook is set
    pub fn has_request_payload(&self) -> bool {
        self.request_payload.is_some()
    }

    /// Whether a failure payload hook is set
    pub fn has_failure_payload(&self) -> bool {
        self.failure_payload.is_some()
    }
}

impl<A> Default for ThunkOptions<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for ThunkOptions<A> {
    fn clone(&self) -> Self {
        Self {
            request_payload: self.request_payload.clone(),
            failure_payload: self.failure_payload.clone(),
        }
    }
}

/// Reusable driver for one routine and one computation
pub struct Thunk<A, P> {
    routine: Arc<Routine<P>>,
    compute: ComputeFn<A, P>,
    options: ThunkOptions<A>,
}

impl<A, P> Thunk<A, P> {
    /// Replace the payload overrides
    pub fn with_options(mut self, options: ThunkOptions<A>) -> Self {
        debug!(
            "Configuring thunk for {} (request hook: {}, failure hook: {})",
            self.routine.routine_type(),
            options.has_request_payload(),
            options.has_failure_payload()
        );
        self.options = options;
        self
    }

    /// The routine whose actions this thunk dispatches
    pub fn routine(&self) -> &Routine<P> {
        &self.routine
    }

    /// Start an invocation with `args`; nothing runs until it is driven
    pub fn invoke(&self, args: A) -> Invocation<A, P> {
        Invocation {
            thunk: self.clone(),
            args,
        }
    }
}

impl<A, P> Thunk<A, P>
where
    A: Serialize + Clone + Send + Sync + 'static,
    P: Serialize + Send + 'static,
{
    /// Invoke with `args` and drive the invocation against `dispatch`
    pub async fn run<D: Dispatch + ?Sized>(&self, args: A, dispatch: &D) -> Result<D::Output> {
        self.invoke(args).run(dispatch).await
    }

    async fn request_payload(&self, args: A) -> HookResult<Payload> {
        match &self.options.request_payload {
            Some(hook) => Ok(hook(args).await?.into()),
            None => Ok(serde_json::to_value(&args)?.into()),
        }
    }

    async fn failure_payload(&self, failure: Failure) -> Failure {
        let Some(hook) = &self.options.failure_payload else {
            return failure;
        };

        match hook(failure.clone()).await {
            Ok(transformed) => transformed,
            Err(e) => {
                warn!(
                    "Failure payload hook for {} failed, keeping original failure: {}",
                    self.routine.routine_type(),
                    e
                );
                failure
            }
        }
    }
}

impl<A, P> Clone for Thunk<A, P> {
    fn clone(&self) -> Self {
        Self {
            routine: self.routine.clone(),
            compute: self.compute.clone(),
            options: self.options.clone(),
        }
    }
}

/// Helper to create a thunk from a routine and its success payload computation
pub fn create_thunk<A, P, F, Fut, E>(routine: Routine<P>, compute: F) -> Thunk<A, P>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<P, E>> + Send + 'static,
    P: 'static,
    E: Into<Failure>,
{
    let compute: ComputeFn<A, P> = Arc::new(move |args| {
        let fut = compute(args);
        Box::pin(async move { fut.await.map_err(Into::<Failure>::into) })
            as BoxFuture<'static, HookResult<P>>
    });

    Thunk {
        routine: Arc::new(routine),
        compute,
        options: ThunkOptions::new(),
    }
}

/// One pending call of a thunk
pub struct Invocation<A, P> {
    thunk: Thunk<A, P>,
    args: A,
}

impl<A, P> Invocation<A, P>
where
    A: Serialize + Clone + Send + Sync + 'static,
    P: Serialize + Send + 'static,
{
    /// The args this invocation was started with
    pub fn args(&self) -> &A {
        &self.args
    }

    /// Drive the invocation to completion
    pub async fn run<D: Dispatch + ?Sized>(self, dispatch: &D) -> Result<D::Output> {
        self.execute(dispatch, None).await
    }

    /// Drive the invocation as an abortable outcome
    pub fn cancellable<D: Dispatch + 'static>(self, dispatch: D) -> Cancellable<D::Output> {
        Cancellable::new(move |signal| async move {
            self.execute(&dispatch, Some(&signal)).await
        })
    }

    async fn execute<D: Dispatch + ?Sized>(
        self,
        dispatch: &D,
        signal: Option<&AbortSignal>,
    ) -> Result<D::Output> {
        let Invocation { thunk, args } = self;
        let routine = thunk.routine.clone();

        let (request, early_failure) =
            match guarded(signal, thunk.request_payload(args.clone())).await? {
                Ok(payload) => (create_action(routine.request_type()).create(payload), None),
                // No payload to report, but REQUEST still precedes FAILURE
                Err(failure) => (routine.request_empty(), Some(failure)),
            };

        checkpoint(signal)?;
        send(dispatch, request).await;

        let failure = match early_failure {
            Some(failure) => failure,
            None => match guarded(signal, (thunk.compute)(args)).await? {
                Ok(payload) => match routine.success(&payload) {
                    Ok(action) => {
                        checkpoint(signal)?;
                        return Ok(send(dispatch, action).await);
                    }
                    Err(e) => e.into(),
                },
                Err(failure) => failure,
            },
        };

        let failure = guarded(signal, thunk.failure_payload(failure)).await?;

        checkpoint(signal)?;
        send(dispatch, routine.failure(failure.clone())).await;
        Err(Error::Failed(failure))
    }
}

async fn send<D: Dispatch + ?Sized>(dispatch: &D, action: Action) -> D::Output {
    debug!("Dispatching {}", action.action_type);
    dispatch.dispatch(action).await
}

async fn guarded<F: Future>(signal: Option<&AbortSignal>, fut: F) -> Result<F::Output> {
    match signal {
        Some(signal) => signal.guard(fut).await,
        None => Ok(fut.await),
    }
}

fn checkpoint(signal: Option<&AbortSignal>) -> Result<()> {
    signal.map_or(Ok(()), AbortSignal::check)
}
