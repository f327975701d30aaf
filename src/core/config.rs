use crate::core::{AppError, AppResult};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const APP_DIR_NAME: &str = "vetpms-desktop";
pub const DEFAULT_MOUNT_TARGET: &str = "#app";
pub const PASSWORD_ENV: &str = "VETPMS_PASSWORD";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "vetpms-desktop",
    version,
    about = "Desktop host for the Veterinary Practice Management Suite"
)]
pub struct Cli {
    /// Use https for API requests
    #[arg(long)]
    pub tls: bool,

    /// API host or url
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub api: String,

    #[arg(long = "api-version", default_value_t = 1)]
    pub api_version: u32,

    /// Connect/read timeout for API requests, e.g. `3s` or `500ms`
    #[arg(long = "read-timeout", default_value = "3s", value_parser = parse_duration)]
    pub read_timeout: Duration,

    /// UI language (`en`, `nl` or `system`)
    #[arg(long, default_value = "nl")]
    pub lang: String,

    /// How long to wait for the native bridge; `0` waits forever
    #[arg(long = "bridge-timeout", default_value = "10s", value_parser = parse_duration)]
    pub bridge_timeout: Duration,

    #[arg(long = "probe-attempts", default_value_t = 5)]
    pub probe_attempts: u32,

    #[arg(long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Sign in as this user once the backend is ready; the password is read
    /// from `VETPMS_PASSWORD`
    #[arg(long)]
    pub email: Option<String>,

    /// Exit as soon as the startup gate resolves
    #[arg(long)]
    pub once: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub enable_tls: bool,
    pub api: String,
    pub api_version: u32,
    pub read_timeout: Duration,
    pub lang: String,
    pub bridge_timeout: Option<Duration>,
    pub probe_attempts: u32,
    pub data_dir: PathBuf,
    pub log_level: Option<String>,
    pub login_email: Option<String>,
    pub exit_after_gate: bool,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> AppResult<Self> {
        let mut config = Self {
            enable_tls: cli.tls,
            api: cli.api,
            api_version: cli.api_version,
            read_timeout: cli.read_timeout,
            lang: cli.lang,
            bridge_timeout: (!cli.bridge_timeout.is_zero()).then_some(cli.bridge_timeout),
            probe_attempts: cli.probe_attempts,
            data_dir: cli.data_dir.unwrap_or_else(default_data_dir),
            log_level: cli.log_level,
            login_email: cli.email.filter(|email| !email.trim().is_empty()),
            exit_after_gate: cli.once,
        };
        config.validate()?;
        Ok(config)
    }

    /// Normalizes the API base into `scheme://host[:port]/` and checks limits.
    pub fn validate(&mut self) -> AppResult<()> {
        let api = self.api.trim();
        if api.is_empty() {
            return Err(config_error("api", "api host must not be empty"));
        }

        let lowered = api.to_ascii_lowercase();
        let mut api = if lowered.starts_with("http://") || lowered.starts_with("https://") {
            api.to_string()
        } else if self.enable_tls {
            format!("https://{api}/")
        } else {
            format!("http://{api}/")
        };
        if !api.ends_with('/') {
            api.push('/');
        }

        let parsed = Url::parse(&api)
            .map_err(|error| config_error("api", "api url is invalid").with_source(error))?;
        if parsed.host_str().is_none() {
            return Err(config_error("api", "api url has no host").with_context("value", api));
        }
        self.api = api;

        if self.api_version == 0 {
            return Err(config_error("apiVersion", "api version starts at 1"));
        }
        if self.read_timeout.is_zero() {
            return Err(config_error("readTimeout", "read timeout must be positive"));
        }
        if self.probe_attempts == 0 {
            return Err(config_error("probeAttempts", "at least one probe attempt is required"));
        }
        Ok(())
    }

    pub fn api_url(&self) -> String {
        format!("{}v{}/", self.api, self.api_version)
    }

    /// `host:port` of the API endpoint, with the scheme's default port.
    pub fn api_address(&self) -> AppResult<String> {
        let parsed = Url::parse(&self.api)
            .map_err(|error| config_error("api", "api url is invalid").with_source(error))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| config_error("api", "api url has no host"))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| config_error("api", "api url has no port"))?;
        Ok(format!("{host}:{port}"))
    }

    pub fn locales_dir(&self) -> PathBuf {
        self.data_dir.join("locales")
    }
}

fn config_error(field: &str, message: &str) -> AppError {
    AppError::new("config_invalid", message).with_context("field", field)
}

/// Accepts `500ms`, `3s`, `2m` or a bare number of seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let value = raw.trim();
    let (digits, unit) = match value.find(|ch: char| !ch.is_ascii_digit()) {
        Some(index) => value.split_at(index),
        None => (value, "s"),
    };
    let amount = digits
        .parse::<u64>()
        .map_err(|_| format!("invalid duration: {raw}"))?;

    match unit.trim() {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount.saturating_mul(60))),
        _ => Err(format!("invalid duration unit: {raw}")),
    }
}

fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_DATA_HOME").filter(|value| !value.is_empty()) {
        return PathBuf::from(dir).join(APP_DIR_NAME);
    }
    if let Some(home) = std::env::var_os("HOME").filter(|value| !value.is_empty()) {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR_NAME);
    }
    PathBuf::from(format!(".{APP_DIR_NAME}"))
}

#[cfg(test)]
#[path = "../../tests/core/config_tests.rs"]
mod tests;
