mod setup;

pub use setup::run;

use crate::app::alerts::Alerts;
use crate::core::router::Router;
use crate::core::view::{MountContext, ViewRoot};
use std::sync::Arc;
use std::time::Duration;
use vetpms_i18n::Localizer;
use vetpms_kernel::{GateHandle, ReadinessSignal, StartupGate};

/// Everything the root view needs, assembled explicitly by the host.
pub struct BootstrapConfig {
    pub router: Arc<Router>,
    pub localizer: Localizer,
    pub view_root: Arc<dyn ViewRoot>,
    pub alerts: Alerts,
    pub mount_target: String,
    pub bridge_timeout: Option<Duration>,
}

/// Mounts the root view once `signal` reports ready.
///
/// Returns immediately. A bridge failure or timeout raises a localized alert
/// instead of mounting; the process keeps running either way.
pub fn bootstrap(config: &BootstrapConfig, signal: ReadinessSignal) -> GateHandle {
    let mut gate = StartupGate::new(signal);
    if let Some(timeout) = config.bridge_timeout {
        gate = gate.with_timeout(timeout);
    }

    let view_root = Arc::clone(&config.view_root);
    let context = MountContext {
        router: Arc::clone(&config.router),
        localizer: config.localizer.clone(),
    };
    let target = config.mount_target.clone();
    let mount_alerts = config.alerts.clone();
    let failure_alerts = config.alerts.clone();

    gate.start_with_failure(
        move || {
            if let Err(error) = view_root.mount(&context, &target) {
                let error = mount_alerts.return_with_alert(error);
                tracing::error!(
                    event = "view_mount_failed",
                    code = %error.code,
                    message = %error.message
                );
            }
        },
        move |error| {
            failure_alerts.bridge_failure(&error);
        },
    )
}

#[cfg(test)]
#[path = "../../tests/bootstrap/bootstrap_tests.rs"]
mod tests;
