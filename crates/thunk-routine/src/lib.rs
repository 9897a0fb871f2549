//! Thunk Routine Library
//!
//! A routine names one class of asynchronous operation and derives three
//! action types from it: REQUEST, SUCCESS and FAILURE. A thunk drives one
//! invocation of that operation, dispatching the REQUEST action before the
//! work starts and exactly one of SUCCESS or FAILURE once it settles.
//!
//! ```no_run
//! use thunk_routine::prelude::*;
//!
//! # async fn example() -> thunk_routine::Result<()> {
//! let fetch_user: Routine<String> = create_routine("USER/FETCH");
//! let thunk = create_thunk(fetch_user.clone(), |id: u32| async move {
//!     Ok::<_, Failure>(format!("user #{id}"))
//! });
//!
//! let store = RecordingDispatch::new();
//! let action = thunk.run(7, &store).await?;
//! assert_eq!(fetch_user.get_success_payload(&action)?, "user #7");
//! # Ok(())
//! # }
//! ```
//!
//! The crate is runtime agnostic; it only relies on `futures` primitives.

#![warn(missing_docs)]

pub mod abort;
pub mod action;
pub mod dispatch;
pub mod error;
pub mod failure;
pub mod legacy;
pub mod routine;
pub mod thunk;

pub use error::{Error, Result};

/// Convenience prelude for thunk-routine users
pub mod prelude {
    pub use crate::abort::{AbortSignal, Cancellable};
    pub use crate::action::{create_action, Action, ActionCreator, Payload, Phase};
    pub use crate::dispatch::{dispatch_fn, Dispatch, FnDispatch, RecordingDispatch};
    pub use crate::error::{Error, Result};
    pub use crate::failure::Failure;
    pub use crate::routine::{create_routine, Routine};
    pub use crate::thunk::{create_thunk, Invocation, Thunk, ThunkOptions};

    // Re-export commonly used types from dependencies
    pub use async_trait::async_trait;
    pub use serde_json::{json, Value};
}
