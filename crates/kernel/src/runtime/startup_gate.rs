use super::join_error_to_app_error;
use super::readiness::ReadinessSignal;
use crate::{AppError, AppResult};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Ready,
    Failed(AppError),
    TimedOut,
    Cancelled,
}

/// Defers a callback until the native bridge reports readiness.
///
/// `start` never blocks: the wait runs as a task on the current tokio
/// runtime and the returned [`GateHandle`] can observe or cancel it. The
/// ready callback is `FnOnce`, so it fires at most once, and only after the
/// signal resolved to ready.
#[derive(Debug)]
pub struct StartupGate {
    signal: ReadinessSignal,
    timeout: Option<Duration>,
}

impl StartupGate {
    pub fn new(signal: ReadinessSignal) -> Self {
        Self {
            signal,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn start<F>(self, on_ready: F) -> GateHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.start_with_failure(on_ready, |_| {})
    }

    /// Like [`StartupGate::start`], with `on_failure` receiving the bridge
    /// error or a `bridge_timeout` error.
    pub fn start_with_failure<F, E>(self, on_ready: F, on_failure: E) -> GateHandle
    where
        F: FnOnce() + Send + 'static,
        E: FnOnce(AppError) + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let Self {
            mut signal,
            timeout,
        } = self;

        tracing::debug!(
            event = "startup_gate_pending",
            timeout_ms = timeout.map(|value| value.as_millis() as u64)
        );

        let task = tokio::spawn(async move {
            let mut outcome = tokio::select! {
                biased;
                _ = cancelled(cancel_rx.clone()) => GateOutcome::Cancelled,
                state = signal.resolved() => match state {
                    Ok(()) => GateOutcome::Ready,
                    Err(error) => GateOutcome::Failed(error),
                },
                _ = expire(timeout) => GateOutcome::TimedOut,
            };

            if outcome != GateOutcome::Cancelled && *cancel_rx.borrow() {
                outcome = GateOutcome::Cancelled;
            }

            match &outcome {
                GateOutcome::Ready => {
                    tracing::info!(event = "startup_gate_ready");
                    on_ready();
                }
                GateOutcome::Failed(error) => {
                    tracing::warn!(
                        event = "startup_gate_failed",
                        code = %error.code,
                        message = %error.message
                    );
                    on_failure(error.clone());
                }
                GateOutcome::TimedOut => {
                    let timeout_ms = timeout.map(|value| value.as_millis()).unwrap_or_default();
                    tracing::warn!(event = "startup_gate_timed_out", timeout_ms = timeout_ms as u64);
                    on_failure(
                        AppError::new("bridge_timeout", "native bridge did not report readiness")
                            .with_context("timeoutMs", timeout_ms.to_string()),
                    );
                }
                GateOutcome::Cancelled => {
                    tracing::debug!(event = "startup_gate_cancelled");
                }
            }

            outcome
        });

        GateHandle {
            cancel: cancel_tx,
            task,
        }
    }
}

async fn cancelled(mut receiver: watch::Receiver<bool>) {
    let closed = receiver.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        // Handle dropped without cancelling: the gate keeps running detached.
        std::future::pending::<()>().await;
    }
}

async fn expire(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending::<()>().await,
    }
}

#[derive(Debug)]
pub struct GateHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<GateOutcome>,
}

impl GateHandle {
    /// Prevents the deferred callbacks from firing if the gate is still pending.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn outcome(self) -> AppResult<GateOutcome> {
        self.task
            .await
            .map_err(|error| join_error_to_app_error("startup_gate", "startup_gate", &error))
    }
}

#[cfg(test)]
#[path = "../../tests/runtime/startup_gate_tests.rs"]
mod tests;
