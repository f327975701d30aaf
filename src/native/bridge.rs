use crate::core::config::AppConfig;
use crate::core::{AppError, AppResult};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use vetpms_kernel::BridgeNotifier;

const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    pub attempts: u32,
    pub interval: Duration,
    pub connect_timeout: Duration,
}

impl ProbePolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            attempts: config.probe_attempts.max(1),
            interval: DEFAULT_PROBE_INTERVAL,
            connect_timeout: config.read_timeout,
        }
    }
}

/// Native side of the bridge: the backend API must accept connections
/// before the UI is allowed to mount.
#[derive(Debug, Clone)]
pub struct NativeCore {
    address: String,
    policy: ProbePolicy,
}

impl NativeCore {
    pub fn new(address: impl Into<String>, policy: ProbePolicy) -> Self {
        Self {
            address: address.into(),
            policy,
        }
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self::new(config.api_address()?, ProbePolicy::from_config(config)))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn probe(&self) -> AppResult<()> {
        let mut last_error = None;
        for attempt in 1..=self.policy.attempts {
            match self.connect_once().await {
                Ok(()) => {
                    tracing::info!(
                        event = "bridge_probe_succeeded",
                        address = %self.address,
                        attempt = attempt
                    );
                    return Ok(());
                }
                Err(error) => {
                    tracing::debug!(
                        event = "bridge_probe_attempt_failed",
                        address = %self.address,
                        attempt = attempt,
                        message = %error.message
                    );
                    last_error = Some(error);
                }
            }

            if attempt < self.policy.attempts {
                tokio::time::sleep(self.policy.interval).await;
            }
        }

        let error = last_error
            .unwrap_or_else(|| AppError::new("bridge_probe_failed", "backend was not probed"));
        Err(error
            .with_code("bridge_probe_failed", "backend is not reachable")
            .with_context("attempts", self.policy.attempts.to_string()))
    }

    async fn connect_once(&self) -> AppResult<()> {
        match tokio::time::timeout(
            self.policy.connect_timeout,
            TcpStream::connect(self.address.as_str()),
        )
        .await
        {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(error)) => Err(AppError::new("bridge_connect_failed", "connection failed")
                .with_context("address", self.address.clone())
                .with_source(error)),
            Err(_) => Err(AppError::new("bridge_connect_failed", "connection timed out")
                .with_context("address", self.address.clone())
                .with_cause(format!(
                    "no connection within {} ms",
                    self.policy.connect_timeout.as_millis()
                ))),
        }
    }
}

/// Runs the native readiness check and resolves the signal with its result.
pub fn spawn_native_bridge(core: NativeCore, notifier: BridgeNotifier) -> JoinHandle<()> {
    tokio::spawn(async move {
        match core.probe().await {
            Ok(()) => {
                notifier.notify_ready();
            }
            Err(error) => {
                notifier.notify_failed(error);
            }
        }
    })
}

#[cfg(test)]
#[path = "../../tests/native/bridge_tests.rs"]
mod tests;
