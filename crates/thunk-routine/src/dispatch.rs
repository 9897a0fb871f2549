//! Dispatch seam
//!
//! The dispatcher is the external operation that submits an action into the
//! surrounding state-update framework. It is always awaited, whether the
//! underlying store is synchronous or not.

use async_trait::async_trait;
use futures::lock::Mutex;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::action::Action;

/// Something that accepts actions
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Value handed back for a dispatched action
    type Output: Send;

    /// Submit an action
    async fn dispatch(&self, action: Action) -> Self::Output;
}

#[async_trait]
impl<D: Dispatch + ?Sized> Dispatch for Arc<D> {
    type Output = D::Output;

    async fn dispatch(&self, action: Action) -> Self::Output {
        (**self).dispatch(action).await
    }
}

/// Dispatcher backed by a closure
#[derive(Clone)]
pub struct FnDispatch<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Dispatch for FnDispatch<F>
where
    F: Fn(Action) -> Fut + Send + Sync,
    Fut: Future + Send + 'static,
    Fut::Output: Send,
{
    type Output = Fut::Output;

    async fn dispatch(&self, action: Action) -> Self::Output {
        (self.f)(action).await
    }
}

/// Wrap a closure returning a future as a dispatcher
pub fn dispatch_fn<F, Fut>(f: F) -> FnDispatch<F>
where
    F: Fn(Action) -> Fut + Send + Sync,
    Fut: Future + Send + 'static,
    Fut::Output: Send,
{
    FnDispatch { f }
}

/// Dispatcher that records every action and hands it back
///
/// Clones share the same record.
#[derive(Clone)]
pub struct RecordingDispatch {
    actions: Arc<Mutex<Vec<Action>>>,
}

impl RecordingDispatch {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self {
            actions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Actions dispatched so far, in order
    pub async fn actions(&self) -> Vec<Action> {
        self.actions.lock().await.clone()
    }

    /// Number of actions dispatched so far
    pub async fn len(&self) -> usize {
        self.actions.lock().await.len()
    }

    /// Whether nothing has been dispatched yet
    pub async fn is_empty(&self) -> bool {
        self.actions.lock().await.is_empty()
    }

    /// Forget every recorded action
    pub async fn clear(&self) {
        self.actions.lock().await.clear();
    }
}

impl Default for RecordingDispatch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dispatch for RecordingDispatch {
    type Output = Action;

    async fn dispatch(&self, action: Action) -> Action {
        debug!("Recording action {}", action.action_type);
        self.actions.lock().await.push(action.clone());
        action
    }
}
