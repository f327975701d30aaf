use crate::core::models::{AlertDto, AlertKind};
use crate::core::{AppError, AppResult};
use std::sync::Arc;
use vetpms_i18n::Localizer;

const SUCCESS_TIMEOUT_MS: u64 = 3_000;

pub trait AlertSink: Send + Sync {
    fn emit(&self, alert: &AlertDto) -> AppResult<()>;
}

/// Prints alerts as JSON lines on stderr.
#[derive(Debug, Default)]
pub struct ConsoleAlertSink;

impl AlertSink for ConsoleAlertSink {
    fn emit(&self, alert: &AlertDto) -> AppResult<()> {
        let line = serde_json::to_string(alert).map_err(|error| {
            AppError::new("alert_serialize_failed", "failed to serialize alert").with_source(error)
        })?;
        eprintln!("{line}");
        Ok(())
    }
}

/// Localized notifications for the UI.
#[derive(Clone)]
pub struct Alerts {
    sink: Arc<dyn AlertSink>,
    localizer: Localizer,
}

impl Alerts {
    pub fn new(sink: Arc<dyn AlertSink>, localizer: Localizer) -> Self {
        Self { sink, localizer }
    }

    pub fn alert(&self, kind: AlertKind, key: &str, params: &[(&str, &str)]) -> AlertDto {
        let timeout_ms = match kind {
            AlertKind::Success | AlertKind::Info => SUCCESS_TIMEOUT_MS,
            AlertKind::Warning | AlertKind::Error => 0,
        };
        let alert = AlertDto {
            kind,
            text: self.localizer.translate(key, params),
            timeout_ms,
        };
        self.publish(&alert);
        alert
    }

    pub fn success(&self, key: &str) -> AlertDto {
        self.alert(AlertKind::Success, key, &[])
    }

    /// Tells the user why the UI never appeared.
    pub fn bridge_failure(&self, error: &AppError) -> AlertDto {
        if error.is("bridge_timeout") {
            let seconds = error
                .context_value("timeoutMs")
                .and_then(|value| value.parse::<u64>().ok())
                .map(|millis| millis.div_ceil(1000))
                .unwrap_or_default()
                .to_string();
            return self.alert(
                AlertKind::Error,
                "native.bridgeTimeout",
                &[("seconds", seconds.as_str())],
            );
        }

        let reason = error.causes.first().unwrap_or(&error.message).clone();
        self.alert(
            AlertKind::Error,
            "native.bridgeFailed",
            &[("reason", reason.as_str())],
        )
    }

    /// Shows `error` to the user and hands it back for propagation.
    pub fn return_with_alert(&self, error: AppError) -> AppError {
        let alert = AlertDto {
            kind: AlertKind::Error,
            text: error.message.clone(),
            timeout_ms: 0,
        };
        self.publish(&alert);
        error
    }

    fn publish(&self, alert: &AlertDto) {
        tracing::info!(
            event = "alert_emitted",
            kind = alert.kind.as_str(),
            text = %alert.text
        );
        if let Err(error) = self.sink.emit(alert) {
            tracing::warn!(
                event = "alert_emit_failed",
                code = %error.code,
                message = %error.message
            );
        }
    }
}

#[cfg(test)]
#[path = "../../tests/app/alerts_tests.rs"]
mod tests;
