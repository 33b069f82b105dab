//! Authenticated session client
//!
//! Every call reads the access token from the [`SessionStore`] at send time,
//! so a token written by login or refresh is used by the very next request.
//! A 401 on a regular endpoint triggers at most one refresh-and-retry per
//! logical request; all other failures are classified and returned as-is.

use std::sync::Arc;
use std::time::Duration;

use casefile_common::{MemorySessionStore, SessionStore};
use casefile_domain::constants::{LOGIN_PATH, TOKEN_REFRESH_PATH};
use casefile_domain::{ApiConfig, Config, CurrentUser};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, instrument};
use url::Url;

use super::errors::ApiError;
use super::events::{SessionEvent, SessionEvents};
use super::request::{instance_path, ApiRequest, RequestBody};
use super::uploads::{media_url, MultipartBody, UploadPolicy};
use crate::http::HttpClient;
use crate::storage::open_store;

/// Position of a send within one logical request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Initial,
    AfterRefresh,
}

impl Attempt {
    fn may_refresh(self) -> bool {
        self == Self::Initial
    }
}

/// Acknowledgement returned by [`SessionClient::delete`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted {
    pub path: String,
    pub message: Option<String>,
}

/// Client for the case-management REST API
///
/// Share it behind an `Arc`; concurrent requests that hit a 401 at the same
/// time share a single refresh.
pub struct SessionClient {
    pub(super) http: HttpClient,
    base_url: Url,
    pub(super) store: Arc<dyn SessionStore>,
    pub(super) events: SessionEvents,
    pub(super) refresh_lock: Mutex<()>,
    /// Bumped whenever a session starts or ends. Held while login, logout,
    /// refresh and termination write to the store.
    pub(super) generation: Mutex<u64>,
    upload_policy: UploadPolicy,
}

impl SessionClient {
    /// Create a client for `config.base_url` backed by `store`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the base URL is invalid or the HTTP
    /// client cannot be built
    pub fn new(config: &ApiConfig, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        Self::builder().api_config(config.clone()).store(store).build()
    }

    /// Create a client, session store and upload policy from `config`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the configuration is invalid or the
    /// configured store cannot be opened
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        config.validate().map_err(|e| ApiError::Config(e.to_string()))?;
        let store = open_store(&config.storage).map_err(|e| ApiError::Config(e.to_string()))?;

        Self::builder()
            .api_config(config.api.clone())
            .store(store)
            .upload_policy(UploadPolicy::from(&config.uploads))
            .build()
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> SessionClientBuilder {
        SessionClientBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn upload_policy(&self) -> &UploadPolicy {
        &self.upload_policy
    }

    /// Receive session lifecycle events (login, refresh, logout, termination).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// User record of the current session, if any.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the store cannot be read
    pub async fn current_user(&self) -> Result<Option<CurrentUser>, ApiError> {
        Ok(self.store.current_user().await?)
    }

    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the store cannot be read
    pub async fn is_authenticated(&self) -> Result<bool, ApiError> {
        Ok(self.store.is_authenticated().await?)
    }

    /// Absolute URL for a media path returned by the API.
    pub fn media_url(&self, path: Option<&str>) -> Option<String> {
        media_url(&self.base_url.origin().ascii_serialization(), path)
    }

    /// Send `request` through the authenticated pipeline and decode the
    /// 2xx body (204/205 and empty bodies decode from `null`).
    ///
    /// # Errors
    ///
    /// Returns the classified failure; `ApiError::SessionTerminated` when a
    /// 401 could not be recovered by refreshing the access token
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(&request).await?;
        let result = Self::decode(response).await?;
        debug!("request successful");
        Ok(result)
    }

    /// # Errors
    ///
    /// See [`request`](Self::request)
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(ApiRequest::get(path)).await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request)
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ApiRequest::post(path).json(body)?).await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request)
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        body: MultipartBody,
    ) -> Result<T, ApiError> {
        self.request(ApiRequest::post(path).multipart(body)).await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request)
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ApiRequest::put(path).json(body)?).await
    }

    /// PATCH `{endpoint}/{id}/`, or `endpoint` itself when `id` is `None`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request)
    pub async fn patch<B, T>(
        &self,
        endpoint: &str,
        id: Option<&str>,
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ApiRequest::patch(instance_path(endpoint, id)).json(body)?).await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request)
    pub async fn patch_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        id: Option<&str>,
        body: MultipartBody,
    ) -> Result<T, ApiError> {
        self.request(ApiRequest::patch(instance_path(endpoint, id)).multipart(body)).await
    }

    /// DELETE `{endpoint}/{id}/`, or `endpoint` itself when `id` is `None`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request)
    pub async fn delete(&self, endpoint: &str, id: Option<&str>) -> Result<Deleted, ApiError> {
        let path = instance_path(endpoint, id);
        let body: Value = self.request(ApiRequest::delete(path.clone())).await?;
        let message = body.get("message").and_then(Value::as_str).map(str::to_string);
        Ok(Deleted { path, message })
    }

    /// Run the attempt sequence for one logical request.
    async fn execute(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let mut attempt = Attempt::Initial;

        loop {
            // Read per send so a token stored by a refresh is picked up.
            let token = self.store.access_token().await?;
            let response = self.send_once(request, token.as_deref()).await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::UNAUTHORIZED
                && attempt.may_refresh()
                && !is_auth_endpoint(request.path())
            {
                debug!(?attempt, "access token rejected");
                self.refresh_after_rejection(token.as_deref()).await?;
                attempt = Attempt::AfterRefresh;
                continue;
            }

            debug!(?attempt, %status, "request failed");
            return Err(Self::error_from_response(response).await);
        }
    }

    /// Send `request` once, with `token` as bearer credential when present.
    pub(super) async fn send_once(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = self.url_for(request.path())?;
        let mut builder = self.http.request(request.method().clone(), url);

        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(body) => {
                let form = body.to_form().map_err(|e| {
                    ApiError::InvalidRequest(format!("Failed to build multipart body: {e}"))
                })?;
                builder.multipart(form)
            }
        };

        let timeout = self.http.timeout();
        match tokio::time::timeout(timeout, self.http.send(builder)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(ApiError::from_transport(err, timeout)),
            Err(_) => Err(ApiError::Timeout(timeout)),
        }
    }

    pub(super) async fn error_from_response(response: Response) -> ApiError {
        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(err) => {
                debug!(%status, error = %err, "failed to read error response body");
                Vec::new()
            }
        };
        ApiError::from_status(status, &body)
    }

    pub(super) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {e}")))?;

        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT || body.is_empty()
        {
            return serde_json::from_value(Value::Null).map_err(|_| {
                ApiError::Decode(format!(
                    "No content response ({}), but response type cannot be deserialized from empty body",
                    status.as_u16()
                ))
            });
        }

        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Decode(format!("Failed to parse response: {e}")))
    }

    fn url_for(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid resource path {path}: {e}")))
    }
}

/// Login and refresh answer 401 for bad credentials, never for an expired
/// access token.
fn is_auth_endpoint(path: &str) -> bool {
    let path = path.trim_start_matches('/');
    path.starts_with(LOGIN_PATH) || path.starts_with(TOKEN_REFRESH_PATH)
}

/// Builder for [`SessionClient`]
pub struct SessionClientBuilder {
    api: ApiConfig,
    timeout: Option<Duration>,
    store: Option<Arc<dyn SessionStore>>,
    upload_policy: UploadPolicy,
    event_capacity: usize,
}

impl Default for SessionClientBuilder {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            timeout: None,
            store: None,
            upload_policy: UploadPolicy::default(),
            event_capacity: 16,
        }
    }
}

impl SessionClientBuilder {
    pub fn api_config(mut self, config: ApiConfig) -> Self {
        self.api = config;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.api.base_url = url.into();
        self
    }

    /// Request timeout; takes precedence over `timeout_secs` in the API
    /// config and keeps sub-second precision.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Session store; defaults to a fresh in-memory store.
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.upload_policy = policy;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// # Errors
    ///
    /// Returns `ApiError::Config` if the base URL is invalid or the HTTP
    /// client cannot be built
    pub fn build(self) -> Result<SessionClient, ApiError> {
        let base_url = parse_base_url(&self.api.base_url)?;
        let timeout = self.timeout.unwrap_or(Duration::from_secs(self.api.timeout_secs));

        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(self.api.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))?;

        info!(base_url = %base_url, timeout_ms = timeout.as_millis(), "session client ready");

        Ok(SessionClient {
            http,
            base_url,
            store: self.store.unwrap_or_else(|| Arc::new(MemorySessionStore::new())),
            events: SessionEvents::new(self.event_capacity),
            refresh_lock: Mutex::new(()),
            generation: Mutex::new(0),
            upload_policy: self.upload_policy,
        })
    }
}

/// Parse the base URL, forcing a trailing slash so relative joins keep the
/// versioned prefix.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let raw = raw.trim();
    let normalized = if raw.ends_with('/') { raw.to_string() } else { format!("{raw}/") };

    let url = Url::parse(&normalized)
        .map_err(|e| ApiError::Config(format!("Invalid API base URL {raw}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::Config(format!("API base URL must be http(s): {raw}")));
    }

    Ok(url)
}
