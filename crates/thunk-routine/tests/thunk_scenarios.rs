//! End-to-end tests for the thunk driver against a recording dispatcher

use smol::Timer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thunk_routine::prelude::*;

fn routine() -> Routine<u32> {
    create_routine("TEST/MOCK_ROUTINE")
}

#[smol_potat::test]
async fn test_success_dispatches_request_then_success() {
    let r = routine();
    let recorder = RecordingDispatch::new();
    let thunk = create_thunk(r.clone(), |_: ()| async { Ok::<_, Failure>(1) });

    thunk.run((), &recorder).await.unwrap();

    assert_eq!(
        recorder.actions().await,
        vec![r.request_empty(), r.success(&1).unwrap()]
    );
}

#[smol_potat::test]
async fn test_failure_rejects_with_raised_error() {
    let r = routine();
    let recorder = RecordingDispatch::new();
    let thunk = create_thunk(r.clone(), |_: ()| async {
        Err::<u32, _>(Failure::new("boom"))
    });

    let err = thunk.run((), &recorder).await.unwrap_err();

    assert_eq!(err.into_failure(), Some(Failure::new("boom")));
    let actions = recorder.actions().await;
    assert_eq!(actions, vec![r.request_empty(), r.failure(Failure::new("boom"))]);
    assert!(actions[1].is_error());
}

#[smol_potat::test]
async fn test_request_payload_override() {
    let r = routine();
    let recorder = RecordingDispatch::new();
    let thunk = create_thunk(r.clone(), |_: String| async { Ok::<_, Failure>(1) })
        .with_options(
            ThunkOptions::new().with_request_payload(|_: String| async { Ok::<_, Failure>("X") }),
        );

    thunk.run("hello".to_string(), &recorder).await.unwrap();

    let actions = recorder.actions().await;
    assert_eq!(r.get_request_payload(&actions[0]).unwrap(), json!("X"));
    assert_eq!(actions[1], r.success(&1).unwrap());
}

#[smol_potat::test]
async fn test_failure_payload_override() {
    let r = routine();
    let recorder = RecordingDispatch::new();
    let thunk = create_thunk(r.clone(), |_: ()| async {
        Err::<u32, _>(Failure::new("boom"))
    })
    .with_options(
        ThunkOptions::new().with_failure_payload(|_| async { Ok::<_, Failure>(Failure::new("wrapped")) }),
    );

    let err = thunk.run((), &recorder).await.unwrap_err();

    assert_eq!(err.failure(), Some(&Failure::new("wrapped")));
    let actions = recorder.actions().await;
    assert_eq!(r.get_failure_payload(&actions[1]).unwrap(), Failure::new("wrapped"));
}

#[smol_potat::test]
async fn test_thunk_is_reusable() {
    let r = routine();
    let recorder = RecordingDispatch::new();
    let thunk = create_thunk(r.clone(), |n: u32| async move { Ok::<_, Failure>(n + 1) });

    thunk.run(1, &recorder).await.unwrap();
    thunk.run(10, &recorder).await.unwrap();

    assert_eq!(
        recorder.actions().await,
        vec![
            r.request(1).unwrap(),
            r.success(&2).unwrap(),
            r.request(10).unwrap(),
            r.success(&11).unwrap(),
        ]
    );
}

#[smol_potat::test]
async fn test_concurrent_invocations_are_independent() {
    let r = routine();
    let recorder = RecordingDispatch::new();
    let thunk = create_thunk(r.clone(), |delay: u32| async move {
        Timer::after(Duration::from_millis(delay as u64)).await;
        if delay == 0 {
            Err(Failure::new("too fast"))
        } else {
            Ok(delay)
        }
    });

    let (slow, fast) = futures::join!(thunk.run(30, &recorder), thunk.run(0, &recorder));

    assert_eq!(r.get_success_payload(&slow.unwrap()).unwrap(), 30);
    assert_eq!(fast.unwrap_err().failure(), Some(&Failure::new("too fast")));

    let actions = recorder.actions().await;
    assert_eq!(actions.len(), 4);

    let position = |action: &Action| actions.iter().position(|a| a == action).unwrap();
    assert!(position(&r.request(30).unwrap()) < position(&r.success(&30).unwrap()));
    assert!(position(&r.request(0).unwrap()) < position(&r.failure(Failure::new("too fast"))));
}

#[smol_potat::test]
async fn test_cancellable_success() {
    let r = routine();
    let recorder = RecordingDispatch::new();
    let thunk = create_thunk(r.clone(), |_: ()| async { Ok::<_, Failure>(3) });

    let outcome = thunk.invoke(()).cancellable(recorder.clone());
    let handle = outcome.abort_handle();

    assert_eq!(outcome.await.unwrap(), r.success(&3).unwrap());
    assert!(!handle.abort(Some("too late".into())));
    assert_eq!(recorder.len().await, 2);
}

#[smol_potat::test]
async fn test_abort_while_computation_is_pending() {
    let r = routine();
    let recorder = RecordingDispatch::new();
    let dropped = Arc::new(AtomicBool::new(false));

    struct DropFlag(Arc<AtomicBool>);
    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    let flag = dropped.clone();
    let thunk = create_thunk(r.clone(), move |_: ()| {
        let guard = DropFlag(flag.clone());
        async move {
            let _guard = guard;
            futures::future::pending::<std::result::Result<u32, Failure>>().await
        }
    });

    let outcome = thunk.invoke(()).cancellable(recorder.clone());
    let handle = outcome.abort_handle();

    let (result, _) = futures::join!(outcome, async {
        Timer::after(Duration::from_millis(20)).await;
        handle.abort(Some("user navigated away".into()));
    });

    match result {
        Err(Error::Aborted { reason }) => {
            assert_eq!(reason.as_deref(), Some("user navigated away"))
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert!(dropped.load(Ordering::SeqCst));
    assert_eq!(recorder.actions().await, vec![r.request_empty()]);
}

#[smol_potat::test]
async fn test_abort_before_start_dispatches_nothing() {
    let r = routine();
    let recorder = RecordingDispatch::new();
    let thunk = create_thunk(r, |_: ()| async { Ok::<_, Failure>(1) });

    let outcome = thunk.invoke(()).cancellable(recorder.clone());
    assert!(outcome.abort(None));

    let err = outcome.await.unwrap_err();
    assert!(err.is_aborted());
    assert!(recorder.is_empty().await);
}

#[smol_potat::test]
async fn test_abort_during_request_hook() {
    let r = routine();
    let recorder = RecordingDispatch::new();
    let thunk = create_thunk(r, |_: ()| async { Ok::<_, Failure>(1) }).with_options(
        ThunkOptions::new().with_request_payload(|_: ()| async {
            futures::future::pending::<std::result::Result<Value, Failure>>().await
        }),
    );

    let outcome = thunk.invoke(()).cancellable(recorder.clone());
    let handle = outcome.abort_handle();

    let (result, _) = futures::join!(outcome, async {
        Timer::after(Duration::from_millis(20)).await;
        handle.abort(Some("cancelled".into()));
    });

    assert!(result.unwrap_err().is_aborted());
    assert!(recorder.is_empty().await);
}

#[smol_potat::test]
async fn test_abort_during_failure_hook() {
    let r = routine();
    let recorder = RecordingDispatch::new();
    let thunk = create_thunk(r.clone(), |_: ()| async {
        Err::<u32, _>(Failure::new("boom"))
    })
    .with_options(ThunkOptions::new().with_failure_payload(|failure| async move {
        Timer::after(Duration::from_secs(5)).await;
        Ok::<_, Failure>(failure)
    }));

    let outcome = thunk.invoke(()).cancellable(recorder.clone());
    let handle = outcome.abort_handle();

    let (result, _) = futures::join!(outcome, async {
        Timer::after(Duration::from_millis(20)).await;
        handle.abort(Some("gave up".into()));
    });

    match result {
        Err(Error::Aborted { reason }) => assert_eq!(reason.as_deref(), Some("gave up")),
        other => panic!("expected abort, got {other:?}"),
    }
    assert_eq!(recorder.actions().await, vec![r.request_empty()]);
}
