//! One-shot readiness signal raised by the native bridge.
//!
//! The signal starts out [`BridgeState::Pending`] and moves to `Ready` or
//! `Failed` exactly once. Later notifications are ignored. The state lives
//! in a `watch` channel so the waiter suspends on the event loop instead of
//! parking a thread.

use crate::AppError;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeState {
    Pending,
    Ready,
    Failed(AppError),
}

impl BridgeState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Creates a fresh signal together with the notifier handed to the native side.
pub fn readiness_channel() -> (BridgeNotifier, ReadinessSignal) {
    let (sender, receiver) = watch::channel(BridgeState::Pending);
    (
        BridgeNotifier {
            sender: Arc::new(sender),
        },
        ReadinessSignal { receiver },
    )
}

#[derive(Debug, Clone)]
pub struct BridgeNotifier {
    sender: Arc<watch::Sender<BridgeState>>,
}

impl BridgeNotifier {
    /// Returns `true` only for the call that resolved the signal.
    pub fn notify_ready(&self) -> bool {
        self.resolve(BridgeState::Ready)
    }

    pub fn notify_failed(&self, error: AppError) -> bool {
        self.resolve(BridgeState::Failed(error))
    }

    pub fn is_resolved(&self) -> bool {
        !self.sender.borrow().is_pending()
    }

    fn resolve(&self, next: BridgeState) -> bool {
        let outcome = match &next {
            BridgeState::Ready => "ready",
            BridgeState::Failed(_) => "failed",
            BridgeState::Pending => return false,
        };

        let resolved = self.sender.send_if_modified(move |state| {
            if !state.is_pending() {
                return false;
            }
            *state = next;
            true
        });

        if resolved {
            tracing::info!(event = "bridge_signal_resolved", outcome = outcome);
        } else {
            tracing::debug!(event = "bridge_signal_ignored", outcome = outcome);
        }
        resolved
    }
}

/// Waiting side of the signal. Not `Clone`: the gate is its only observer.
#[derive(Debug)]
pub struct ReadinessSignal {
    receiver: watch::Receiver<BridgeState>,
}

impl ReadinessSignal {
    pub fn state(&self) -> BridgeState {
        self.receiver.borrow().clone()
    }

    /// Suspends until the bridge resolves the signal.
    ///
    /// If every notifier is dropped while still pending the signal can never
    /// resolve, so the future stays pending forever.
    pub async fn resolved(&mut self) -> Result<(), AppError> {
        let state = self
            .receiver
            .wait_for(|state| !state.is_pending())
            .await
            .map(|state| state.clone());

        match state {
            Ok(BridgeState::Failed(error)) => Err(error),
            Ok(_) => Ok(()),
            Err(_) => {
                tracing::debug!(event = "bridge_notifier_dropped");
                std::future::pending().await
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/runtime/readiness_tests.rs"]
mod tests;
