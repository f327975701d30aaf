use crate::app::alerts::Alerts;
use crate::core::config::AppConfig;
use crate::core::models::{NewUserDto, UpdateUserDto, UserDto};
use crate::core::{AppError, AppResult};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ServerErrorBody {
    error: String,
}

#[derive(Debug, Default)]
struct Session {
    token: Option<String>,
    user: Option<UserDto>,
}

/// Client for the practice management API.
///
/// Holds the bearer token of the signed-in user. Every failed call raises an
/// error alert before the error is returned; mutating calls raise a success
/// alert.
pub struct ApiClient {
    http: Client,
    base_url: Url,
    alerts: Alerts,
    session: Mutex<Session>,
}

impl ApiClient {
    pub fn new(base_url: &str, read_timeout: Duration, alerts: Alerts) -> AppResult<Self> {
        let parsed = Url::parse(base_url).map_err(|error| {
            AppError::new("api_url_invalid", "api url is invalid")
                .with_context("url", base_url)
                .with_source(error)
        })?;
        if parsed.cannot_be_a_base() {
            return Err(AppError::new("api_url_invalid", "api url cannot carry a path")
                .with_context("url", base_url));
        }

        let http = Client::builder()
            .timeout(read_timeout)
            .build()
            .map_err(|error| {
                AppError::new("api_client_init_failed", "failed to build http client")
                    .with_source(error)
            })?;

        Ok(Self {
            http,
            base_url: parsed,
            alerts,
            session: Mutex::new(Session::default()),
        })
    }

    pub fn from_config(config: &AppConfig, alerts: Alerts) -> AppResult<Self> {
        Self::new(&config.api_url(), config.read_timeout, alerts)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn current_user(&self) -> Option<UserDto> {
        self.session.lock().ok().and_then(|session| session.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .lock()
            .map(|session| session.token.is_some())
            .unwrap_or(false)
    }

    /// Exchanges credentials for a token, then loads the signed-in user.
    pub async fn login(&self, identifier: &str, password: &str) -> AppResult<UserDto> {
        let token = self.request_token(identifier, password).await;
        let token = self.alerted(token)?;
        self.with_session(|session| {
            session.token = Some(token);
            session.user = None;
        })?;

        let user = match self.me().await {
            Ok(user) => user,
            Err(error) => {
                self.with_session(|session| session.token = None)?;
                return Err(error);
            }
        };
        self.with_session(|session| session.user = Some(user.clone()))?;

        tracing::info!(event = "user_logged_in", user_id = %user.id);
        self.alerts.success("native.alerts.loginOk");
        Ok(user)
    }

    pub fn logout(&self) -> AppResult<()> {
        self.with_session(|session| {
            session.token = None;
            session.user = None;
        })?;
        tracing::info!(event = "user_logged_out");
        self.alerts.success("native.alerts.logoutOk");
        Ok(())
    }

    pub async fn me(&self) -> AppResult<UserDto> {
        let result = self.fetch(Method::GET, &["user"], None).await;
        self.alerted(result)
    }

    pub async fn user_create(&self, user: &NewUserDto) -> AppResult<UserDto> {
        let result = match to_body(user) {
            Ok(body) => self.fetch(Method::POST, &["users"], Some(body)).await,
            Err(error) => Err(error),
        };
        let created = self.alerted(result)?;
        self.alerts.success("native.alerts.userCreateOk");
        Ok(created)
    }

    pub async fn user_get(&self, id: &str) -> AppResult<UserDto> {
        let result = match require_id(id) {
            Ok(id) => self.fetch(Method::GET, &["users", id], None).await,
            Err(error) => Err(error),
        };
        self.alerted(result)
    }

    pub async fn user_list(&self) -> AppResult<Vec<UserDto>> {
        let result = self.fetch(Method::GET, &["users"], None).await;
        self.alerted(result)
    }

    /// The API answers `204 No Content`; reload with [`ApiClient::user_get`].
    pub async fn user_update(&self, id: &str, update: &UpdateUserDto) -> AppResult<()> {
        let result = match (require_id(id), to_body(update)) {
            (Ok(id), Ok(body)) => self
                .send(Method::PUT, &["users", id], Some(body))
                .await
                .map(|_| ()),
            (Err(error), _) | (_, Err(error)) => Err(error),
        };
        self.alerted(result)?;
        self.alerts.success("native.alerts.userUpdateOk");
        Ok(())
    }

    pub async fn user_delete(&self, id: &str) -> AppResult<()> {
        let result = match require_id(id) {
            Ok(id) => self
                .send(Method::DELETE, &["users", id], None)
                .await
                .map(|_| ()),
            Err(error) => Err(error),
        };
        self.alerted(result)?;
        self.alerts.success("native.alerts.userDeleteOk");
        Ok(())
    }

    async fn request_token(&self, identifier: &str, password: &str) -> AppResult<String> {
        let builder = self
            .http
            .request(Method::GET, self.endpoint(&["users", "token"])?)
            .basic_auth(identifier, Some(password));
        let body = self.execute(builder).await?;
        let response: TokenResponse = decode(&body)?;
        Ok(response.token)
    }

    async fn fetch<T>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
    ) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let body = self.send(method, segments, body).await?;
        decode(&body)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
    ) -> AppResult<String> {
        let token = self.with_session(|session| session.token.clone())?;
        let mut builder = self.http.request(method, self.endpoint(segments)?);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        self.execute(builder).await
    }

    async fn execute(&self, builder: RequestBuilder) -> AppResult<String> {
        let request = builder.build().map_err(|error| {
            AppError::new("api_request_invalid", "failed to build api request").with_source(error)
        })?;
        let method = request.method().clone();
        let url = request.url().to_string();
        tracing::info!(event = "api_request", method = %method, url = %url);

        let response = self.http.execute(request).await.map_err(|error| {
            AppError::new("api_request_failed", "api request failed")
                .with_context("url", url.clone())
                .with_source(error)
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|error| {
            AppError::new("api_response_read_failed", "failed to read api response")
                .with_context("url", url.clone())
                .with_source(error)
        })?;

        if !status.is_success() {
            tracing::warn!(
                event = "api_request_rejected",
                method = %method,
                url = %url,
                status = status.as_u16()
            );
            return Err(server_error(status, &body).with_context("url", url));
        }
        Ok(body)
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::new("api_url_invalid", "api url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn with_session<R>(&self, update: impl FnOnce(&mut Session) -> R) -> AppResult<R> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::new("api_session_poisoned", "failed to access api session"))?;
        Ok(update(&mut session))
    }

    fn alerted<T>(&self, result: AppResult<T>) -> AppResult<T> {
        result.map_err(|error| self.alerts.return_with_alert(error))
    }
}

/// Non-2xx response as an error carrying the HTTP status.
fn server_error(status: StatusCode, body: &str) -> AppError {
    let code = status.as_u16().to_string();
    let detail = serde_json::from_str::<ServerErrorBody>(body)
        .ok()
        .map(|body| body.error)
        .filter(|error| !error.trim().is_empty())
        .unwrap_or_else(|| status.to_string());
    let message = if detail.contains(&code) {
        detail
    } else {
        format!("{detail} ({code})")
    };
    AppError::new("server_error", message).with_context("status", code)
}

fn decode<T>(body: &str) -> AppResult<T>
where
    T: DeserializeOwned,
{
    serde_json::from_str(body).map_err(|error| {
        AppError::new("api_response_invalid", "api response is not valid json").with_source(error)
    })
}

fn to_body<T>(value: &T) -> AppResult<serde_json::Value>
where
    T: serde::Serialize,
{
    serde_json::to_value(value).map_err(|error| {
        AppError::new("api_request_invalid", "failed to encode api request").with_source(error)
    })
}

fn require_id(id: &str) -> AppResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::new("api_argument_invalid", "user id is required"));
    }
    Ok(id)
}

#[cfg(test)]
#[path = "../../tests/native/api_tests.rs"]
mod tests;
