mod blocking;
mod readiness;
mod startup_gate;

pub use blocking::run_blocking;
pub use readiness::{BridgeNotifier, BridgeState, ReadinessSignal, readiness_channel};
pub use startup_gate::{GateHandle, GateOutcome, StartupGate};

use crate::AppError;

fn join_error_to_app_error(kind: &str, label: &str, error: &tokio::task::JoinError) -> AppError {
    let (code, message) = if error.is_cancelled() {
        ("aborted", "task was aborted")
    } else if error.is_panic() {
        ("panicked", "task panicked")
    } else {
        ("failed", "task failed")
    };

    AppError::new(format!("{kind}_{code}"), message)
        .with_context("task", label)
        .with_cause(join_error_detail(error))
}

fn join_error_detail(error: &tokio::task::JoinError) -> String {
    let debug_text = format!("{error:?}");
    if debug_text.trim().is_empty() {
        "join error".to_string()
    } else {
        debug_text
    }
}
