use super::*;
use std::time::Duration;

#[test]
fn notifier_should_resolve_only_once() {
    let (notifier, signal) = readiness_channel();
    let second = notifier.clone();

    assert!(signal.state().is_pending());
    assert!(notifier.notify_ready());
    assert!(!second.notify_ready());
    assert!(!second.notify_failed(AppError::new("bridge_probe_failed", "late failure")));
    assert_eq!(signal.state(), BridgeState::Ready);
    assert!(second.is_resolved());
}

#[test]
fn failure_should_be_terminal() {
    let (notifier, signal) = readiness_channel();

    assert!(notifier.notify_failed(AppError::new("bridge_probe_failed", "backend down")));
    assert!(!notifier.notify_ready());
    match signal.state() {
        BridgeState::Failed(error) => assert!(error.is("bridge_probe_failed")),
        other => panic!("unexpected state: {other:?}"),
    }
}

#[tokio::test]
async fn resolved_should_return_immediately_when_already_ready() {
    let (notifier, mut signal) = readiness_channel();
    notifier.notify_ready();

    signal.resolved().await.expect("ready signal");
}

#[tokio::test]
async fn resolved_should_wake_after_notification() {
    let (notifier, mut signal) = readiness_channel();
    let waiter = tokio::spawn(async move { signal.resolved().await });

    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    notifier.notify_failed(AppError::new("bridge_probe_failed", "refused"));
    let error = waiter
        .await
        .expect("join waiter")
        .expect_err("failure expected");
    assert!(error.is("bridge_probe_failed"));
}

#[tokio::test(start_paused = true)]
async fn resolved_should_stay_pending_when_notifier_dropped() {
    let (notifier, mut signal) = readiness_channel();
    drop(notifier);

    let result = tokio::time::timeout(Duration::from_secs(60), signal.resolved()).await;
    assert!(result.is_err());
}
