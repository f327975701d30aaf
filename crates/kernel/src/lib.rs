pub mod runtime;

pub use protocol::{AppError, AppResult, ResultExt};
pub use runtime::{
    BridgeNotifier, BridgeState, GateHandle, GateOutcome, ReadinessSignal, StartupGate,
    readiness_channel, run_blocking,
};
