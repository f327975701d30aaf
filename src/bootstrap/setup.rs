use super::{BootstrapConfig, bootstrap};
use crate::app::alerts::{Alerts, ConsoleAlertSink};
use crate::core::config::{AppConfig, Cli, DEFAULT_MOUNT_TARGET, PASSWORD_ENV};
use crate::core::router::{RouteTable, Router, default_routes};
use crate::core::view::ConsoleViewRoot;
use crate::core::{AppError, AppResult};
use crate::native::{ApiClient, NativeCore, spawn_native_bridge};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use vetpms_i18n::{LocaleState, LocaleTable, Localizer};
use vetpms_kernel::{GateOutcome, readiness_channel, run_blocking};
use vetpms_logging::{LoggingOptions, init_logging};

pub(crate) fn log_warn_fallback(message: &str) {
    if tracing::dispatcher::has_been_set() {
        tracing::warn!(event = "bootstrap_warning", message = message);
        return;
    }

    eprintln!("{message}");
}

pub(crate) fn log_error_fallback(message: &str) {
    if tracing::dispatcher::has_been_set() {
        tracing::error!(event = "bootstrap_error", message = message);
        return;
    }

    eprintln!("{message}");
}

async fn load_locale_table(config: &AppConfig) -> AppResult<Arc<LocaleTable>> {
    let overlay_root = config.locales_dir();
    let table = run_blocking("load_locale_table", move || {
        LocaleTable::load(Some(overlay_root.as_path()))
    })
    .await?;
    Ok(Arc::new(table))
}

/// Host entry point: config, logging, catalog, bridge, then the gated mount.
pub async fn run(cli: Cli) -> AppResult<()> {
    let config = AppConfig::from_cli(cli).inspect_err(|error| {
        log_error_fallback(&format!("invalid configuration: {error}"));
    })?;

    let _logging_guard = match init_logging(
        &LoggingOptions::new(&config.data_dir).with_level(config.log_level.clone()),
    ) {
        Ok(guard) => Some(guard),
        Err(error) => {
            log_warn_fallback(&format!("logging disabled: {error}"));
            None
        }
    };

    let session_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("session", session_id = %session_id);
    run_session(config).instrument(span).await
}

async fn run_session(config: AppConfig) -> AppResult<()> {
    tracing::info!(
        event = "host_starting",
        api_url = %config.api_url(),
        lang = %config.lang,
        data_dir = %config.data_dir.display()
    );

    let table = load_locale_table(&config).await?;
    let locale_state = LocaleState::from_preference(&config.lang, &table);
    tracing::info!(
        event = "locale_resolved",
        preference = %locale_state.preference,
        resolved = %locale_state.resolved
    );
    let localizer = Localizer::new(Arc::clone(&table), &locale_state);

    let router = Arc::new(Router::new(RouteTable::new(default_routes())?));
    let alerts = Alerts::new(Arc::new(ConsoleAlertSink), localizer.clone());
    let native_core = NativeCore::from_config(&config)?;
    let api = ApiClient::from_config(&config, alerts.clone())?;

    let (notifier, signal) = readiness_channel();
    let bootstrap_config = BootstrapConfig {
        router,
        localizer,
        view_root: Arc::new(ConsoleViewRoot::stdout()),
        alerts,
        mount_target: DEFAULT_MOUNT_TARGET.to_string(),
        bridge_timeout: config.bridge_timeout,
    };
    let gate = bootstrap(&bootstrap_config, signal);
    let _bridge = spawn_native_bridge(native_core, notifier);

    let outcome = tokio::select! {
        outcome = gate.outcome() => outcome?,
        _ = interrupted() => {
            tracing::info!(event = "host_interrupted_before_ready");
            return Ok(());
        }
    };
    log_outcome(&outcome);

    if outcome == GateOutcome::Ready {
        sign_in(&api, &config).await;
    }

    if config.exit_after_gate {
        sign_out(&api);
        return gate_exit_status(outcome, config.bridge_timeout);
    }

    interrupted().await;
    sign_out(&api);
    tracing::info!(event = "host_shutdown");
    Ok(())
}

/// Resolves on ctrl-c. Without a working signal handler it never resolves.
async fn interrupted() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(event = "signal_handler_unavailable", error = %error);
        std::future::pending::<()>().await;
    }
}

async fn sign_in(api: &ApiClient, config: &AppConfig) {
    let Some(email) = config.login_email.as_deref() else {
        return;
    };
    let Ok(password) = std::env::var(PASSWORD_ENV) else {
        log_warn_fallback(&format!("{PASSWORD_ENV} is not set; skipping sign in"));
        return;
    };

    if let Err(error) = api.login(email, &password).await {
        tracing::warn!(
            event = "sign_in_failed",
            code = %error.code,
            message = %error.message
        );
    }
}

fn sign_out(api: &ApiClient) {
    if !api.is_authenticated() {
        return;
    }
    if let Err(error) = api.logout() {
        tracing::warn!(event = "sign_out_failed", code = %error.code);
    }
}

/// Exit status of `--once`: ready or cancelled is success, anything else
/// is the bridge error.
fn gate_exit_status(outcome: GateOutcome, bridge_timeout: Option<Duration>) -> AppResult<()> {
    match outcome {
        GateOutcome::Ready | GateOutcome::Cancelled => Ok(()),
        GateOutcome::Failed(error) => Err(error),
        GateOutcome::TimedOut => {
            let timeout_ms = bridge_timeout
                .map(|value| value.as_millis())
                .unwrap_or_default();
            Err(
                AppError::new("bridge_timeout", "native bridge did not report readiness")
                    .with_context("timeoutMs", timeout_ms.to_string()),
            )
        }
    }
}

fn log_outcome(outcome: &GateOutcome) {
    match outcome {
        GateOutcome::Ready => tracing::info!(event = "host_ready"),
        GateOutcome::Failed(error) => tracing::warn!(
            event = "host_degraded",
            reason = "bridge_failed",
            code = %error.code
        ),
        GateOutcome::TimedOut => tracing::warn!(event = "host_degraded", reason = "bridge_timeout"),
        GateOutcome::Cancelled => tracing::info!(event = "host_gate_cancelled"),
    }
}

#[cfg(test)]
#[path = "../../tests/bootstrap/setup_tests.rs"]
mod tests;
