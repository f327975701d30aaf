use super::*;
use crate::runtime::readiness_channel;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

fn counting_callback(counter: &Arc<AtomicUsize>) -> impl FnOnce() + Send + 'static {
    let counter = Arc::clone(counter);
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn gate_should_invoke_callback_once_for_repeated_signals() {
    let (notifier, signal) = readiness_channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let handle = StartupGate::new(signal).start(counting_callback(&calls));

    let resolutions = (0..16)
        .map(|_| notifier.clone().notify_ready())
        .filter(|resolved| *resolved)
        .count();

    assert_eq!(resolutions, 1);
    assert_eq!(handle.outcome().await.expect("gate outcome"), GateOutcome::Ready);
    notifier.notify_ready();
    tokio::task::yield_now().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn gate_should_not_fire_before_signal_while_other_work_runs() {
    let (notifier, signal) = readiness_channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let ticks = Arc::new(AtomicUsize::new(0));
    let handle = StartupGate::new(signal).start(counting_callback(&calls));

    let worker_ticks = Arc::clone(&ticks);
    let worker = tokio::spawn(async move {
        for _ in 0..10 {
            worker_ticks.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
        }
    });

    for _ in 0..20 {
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
    worker.await.expect("worker finished");
    assert_eq!(ticks.load(Ordering::SeqCst), 10);
    assert!(!handle.is_finished());

    notifier.notify_ready();
    assert_eq!(handle.outcome().await.expect("gate outcome"), GateOutcome::Ready);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn gate_without_signal_should_stay_pending_and_responsive() {
    let (_notifier, signal) = readiness_channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let handle = StartupGate::new(signal).start(counting_callback(&calls));

    let timer = tokio::time::sleep(Duration::from_secs(3600));
    timer.await;

    let echoed = tokio::spawn(async { 7 }).await.expect("runtime still serving tasks");
    assert_eq!(echoed, 7);
    assert!(!handle.is_finished());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn gate_should_report_timeout_distinctly() {
    let (_notifier, signal) = readiness_channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);

    let handle = StartupGate::new(signal)
        .with_timeout(Duration::from_secs(5))
        .start_with_failure(counting_callback(&calls), move |error| {
            sink.lock().expect("failure sink").push(error);
        });

    assert_eq!(handle.outcome().await.expect("gate outcome"), GateOutcome::TimedOut);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let failures = failures.lock().expect("failure sink");
    assert_eq!(failures.len(), 1);
    assert!(failures[0].is("bridge_timeout"));
    assert_eq!(failures[0].context_value("timeoutMs"), Some("5000"));
}

#[tokio::test]
async fn gate_should_forward_bridge_failure() {
    let (notifier, signal) = readiness_channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(AtomicUsize::new(0));
    let failure_counter = Arc::clone(&failures);

    let handle = StartupGate::new(signal).start_with_failure(
        counting_callback(&calls),
        move |error| {
            assert!(error.is("bridge_probe_failed"));
            failure_counter.fetch_add(1, Ordering::SeqCst);
        },
    );

    notifier.notify_failed(AppError::new("bridge_probe_failed", "connection refused"));
    notifier.notify_ready();

    match handle.outcome().await.expect("gate outcome") {
        GateOutcome::Failed(error) => assert!(error.is("bridge_probe_failed")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancelled_gate_should_never_fire() {
    let (notifier, signal) = readiness_channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let handle = StartupGate::new(signal).start(counting_callback(&calls));

    handle.cancel();
    notifier.notify_ready();

    assert_eq!(
        handle.outcome().await.expect("gate outcome"),
        GateOutcome::Cancelled
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dropped_handle_should_keep_gate_running() {
    let (notifier, signal) = readiness_channel();
    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    drop(StartupGate::new(signal).start(move || {
        let _ = done_tx.send(());
    }));

    notifier.notify_ready();
    done_rx.await.expect("callback fired after handle drop");
}

#[tokio::test]
async fn panicking_callback_should_surface_as_error() {
    let (notifier, signal) = readiness_channel();
    let handle = StartupGate::new(signal).start(|| panic!("mount exploded"));

    notifier.notify_ready();
    let error = handle.outcome().await.expect_err("panic mapped to error");
    assert!(error.is("startup_gate_panicked"));
}
