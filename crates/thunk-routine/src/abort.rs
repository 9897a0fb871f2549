//! Cooperative cancellation
//!
//! An [`AbortSignal`] is shared between the party that may cancel an
//! invocation and the futures doing the work. Aborting closes an internal
//! channel, which wakes every task waiting in [`AbortSignal::aborted`].
//! Work raced through [`AbortSignal::guard`] is dropped when the abort wins.
//!
//! [`Cancellable`] pairs a boxed future with its signal so the outcome of an
//! invocation can be awaited and aborted independently.

use futures::future::{self, BoxFuture, Either};
use std::future::Future;
use std::pin::{pin, Pin};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tracing::info;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Pending,
    Aborted(Option<String>),
    Settled,
}

struct Inner {
    state: Mutex<State>,
    closer: async_channel::Sender<()>,
    listener: async_channel::Receiver<()>,
}

/// Shared cancellation flag carrying an optional reason
#[derive(Clone)]
pub struct AbortSignal {
    inner: Arc<Inner>,
}

impl AbortSignal {
    /// Create a signal that has not been aborted
    pub fn new() -> Self {
        let (closer, listener) = async_channel::bounded(1);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Pending),
                closer,
                listener,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Request cancellation
    ///
    /// Returns `false` when the signal was already aborted or settled, in
    /// which case nothing changes.
    pub fn abort(&self, reason: Option<String>) -> bool {
        let mut state = self.state();
        if *state != State::Pending {
            return false;
        }

        info!(
            "Aborting invocation{}",
            reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default()
        );
        *state = State::Aborted(reason);
        self.inner.closer.close();
        true
    }

    /// Mark the guarded work as finished; later aborts become no-ops
    ///
    /// Returns `false` if the signal had already been aborted.
    pub fn settle(&self) -> bool {
        let mut state = self.state();
        match *state {
            State::Pending => {
                *state = State::Settled;
                true
            }
            State::Settled => true,
            State::Aborted(_) => false,
        }
    }

    /// Whether cancellation has been requested
    pub fn is_aborted(&self) -> bool {
        matches!(*self.state(), State::Aborted(_))
    }

    /// Whether the guarded work finished without being aborted
    pub fn is_settled(&self) -> bool {
        *self.state() == State::Settled
    }

    /// Reason given to `abort`, if aborted with one
    pub fn reason(&self) -> Option<String> {
        match &*self.state() {
            State::Aborted(reason) => reason.clone(),
            _ => None,
        }
    }

    /// `Err(Error::Aborted)` once cancellation has been requested
    pub fn check(&self) -> Result<()> {
        match &*self.state() {
            State::Aborted(reason) => Err(Error::aborted(reason.clone())),
            _ => Ok(()),
        }
    }

    /// Resolve once cancellation has been requested
    pub async fn aborted(&self) {
        while !self.is_aborted() {
            // Nothing is ever sent; `recv` only returns once the channel closes
            if self.inner.listener.recv().await.is_err() {
                break;
            }
        }
    }

    /// Run `fut` unless cancellation is requested first
    ///
    /// If the abort wins, `fut` is dropped and `Error::Aborted` is returned.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output> {
        self.check()?;

        let fut = pin!(fut);
        let aborted = pin!(self.aborted());
        match future::select(fut, aborted).await {
            Either::Left((output, _)) => Ok(output),
            Either::Right(((), _)) => Err(Error::aborted(self.reason())),
        }
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortSignal")
            .field("state", &*self.state())
            .finish()
    }
}

/// A future whose outcome can be aborted
///
/// Once aborted before settling, the outcome resolves to
/// `Err(Error::Aborted)` carrying the abort reason.
///
/// The outcome settles when this future observes the inner work finish, not
/// when the work's last dispatch is sent. An abort landing in between still
/// wins: the terminal action has been dispatched but its output is dropped.
pub struct Cancellable<T> {
    future: BoxFuture<'static, Result<T>>,
    signal: AbortSignal,
}

impl<T> Cancellable<T> {
    /// Build from an executor that receives the signal
    pub fn new<F, Fut>(executor: F) -> Self
    where
        F: FnOnce(AbortSignal) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let signal = AbortSignal::new();
        Self {
            future: Box::pin(executor(signal.clone())),
            signal,
        }
    }

    /// Wrap an ongoing computation; aborting drops it
    pub fn wrap<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        Self::new(|signal| async move { signal.guard(fut).await })
    }

    /// Abort the outcome if it has not settled yet
    pub fn abort(&self, reason: Option<String>) -> bool {
        self.signal.abort(reason)
    }

    /// A handle able to abort this outcome after it is moved or awaited
    pub fn abort_handle(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Whether this outcome was aborted
    pub fn is_aborted(&self) -> bool {
        self.signal.is_aborted()
    }
}

impl<T> Future for Cancellable<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.future.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(result) => {
                if this.signal.settle() {
                    Poll::Ready(result)
                } else {
                    Poll::Ready(Err(Error::aborted(this.signal.reason())))
                }
            }
        }
    }
}
