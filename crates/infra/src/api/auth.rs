//! Session lifecycle: login, logout, profile and token refresh
//!
//! Refresh is single-flight. Requests rejected with a 401 queue on
//! `refresh_lock`; the first one calls `token/refresh/`, later ones see the
//! rotated token (or the terminated session) and do not call it again.
//!
//! Every store write that starts, renews or ends a session happens under the
//! `generation` lock. Login, logout and termination bump the generation; a
//! refresh whose generation moved while its network call was in flight
//! discards the result instead of writing over the newer session.

use casefile_domain::constants::{
    CHANGE_PASSWORD_PATH, LOGIN_PATH, PROFILE_PATH, REGISTER_PATH, TOKEN_REFRESH_PATH,
};
use casefile_domain::{
    CurrentUser, LoginRequest, LoginResponse, MessageResponse, PasswordChange, RefreshRequest,
    RefreshResponse, Registration, Session, UserEnvelope,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::client::SessionClient;
use super::errors::ApiError;
use super::events::SessionEvent;
use super::request::ApiRequest;

impl SessionClient {
    /// Exchange credentials for a token pair and persist the session.
    ///
    /// Never refreshes or retries; a 401 here means bad credentials.
    ///
    /// # Errors
    ///
    /// - `ApiError::Auth` / `ApiError::Validation` when the server rejects
    ///   the credentials (server message preserved)
    /// - `ApiError::Network` / `ApiError::Timeout` on transport failure
    /// - `ApiError::Decode` when the response lacks a token pair
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest::new(username, password))?;
        let response = self.send_once(&request, None).await?;

        if !response.status().is_success() {
            let err = Self::error_from_response(response).await;
            warn!(error = %err, "login rejected");
            return Err(err);
        }

        let payload: LoginResponse = Self::decode(response).await?;
        let session = payload.into_session().ok_or_else(|| {
            ApiError::Decode("Login response did not include an access/refresh token pair".into())
        })?;

        {
            let mut generation = self.generation.lock().await;
            *generation += 1;
            self.store.save(&session).await?;
        }

        let username = session.username().unwrap_or(username).to_string();
        info!(%username, "login succeeded");
        self.events.publish(SessionEvent::LoggedIn { username });

        Ok(session)
    }

    /// Clear the stored session. Local only, no network call.
    ///
    /// Idempotent: with no stored session nothing is published.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the store cannot be cleared
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let mut generation = self.generation.lock().await;
        if self.store.is_empty().await? {
            debug!("logout with no active session");
            return Ok(());
        }

        *generation += 1;
        self.store.clear().await?;
        drop(generation);

        info!("logged out");
        self.events.publish(SessionEvent::LoggedOut);
        Ok(())
    }

    /// Create an account. Does not start a session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with the server's field errors when the
    /// payload is rejected
    #[instrument(skip(self, payload))]
    pub async fn register<B: Serialize + ?Sized>(
        &self,
        payload: &B,
    ) -> Result<Registration, ApiError> {
        let request = ApiRequest::post(REGISTER_PATH).json(payload)?;
        let response = self.send_once(&request, None).await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let registration: Registration = Self::decode(response).await?;
        info!(username = %registration.user.username, "account registered");
        Ok(registration)
    }

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request)
    pub async fn profile(&self) -> Result<CurrentUser, ApiError> {
        self.get(PROFILE_PATH).await
    }

    /// Update the profile and replace the stored user record.
    ///
    /// The record is not stored when the session ended or changed while the
    /// update was in flight.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request); `ApiError::Storage` if the new record
    /// cannot be stored
    pub async fn update_profile<B: Serialize + ?Sized>(
        &self,
        body: &B,
    ) -> Result<CurrentUser, ApiError> {
        let started = *self.generation.lock().await;
        let envelope: UserEnvelope = self.put(PROFILE_PATH, body).await?;

        let generation = self.generation.lock().await;
        if *generation == started {
            self.store.set_current_user(&envelope.user).await?;
        } else {
            debug!("session changed during profile update; stored user left as is");
        }
        Ok(envelope.user)
    }

    /// # Errors
    ///
    /// `ApiError::Validation` when the current password is wrong or the new
    /// one is rejected; otherwise see [`request`](Self::request)
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let body = PasswordChange {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.post(CHANGE_PASSWORD_PATH, &body).await
    }

    /// Renew the access token after `rejected` drew a 401.
    ///
    /// Returns `Ok(())` once a usable access token is stored, either by this
    /// call or by a concurrent one.
    pub(super) async fn refresh_after_rejection(
        &self,
        rejected: Option<&str>,
    ) -> Result<(), ApiError> {
        let _flight = self.refresh_lock.lock().await;

        let (started, refresh_token) = {
            let mut generation = self.generation.lock().await;

            let current = self.store.access_token().await?;
            if current.is_some() && current.as_deref() != rejected {
                debug!("access token already renewed by a concurrent request");
                return Ok(());
            }

            match self.store.refresh_token().await? {
                Some(token) => (*generation, token),
                None if rejected.is_some() && current.is_none() => {
                    // Cleared while we waited: terminated (or logged out) elsewhere.
                    return Err(ApiError::terminated("session already ended", None));
                }
                None => {
                    return Err(self
                        .terminate(&mut generation, "no refresh token available", None)
                        .await);
                }
            }
        };

        let outcome = self.request_access_token(&refresh_token).await;

        let mut generation = self.generation.lock().await;
        if *generation != started {
            debug!("session changed during refresh; discarding result");
            return Err(ApiError::terminated("session changed during refresh", None));
        }

        match outcome {
            Ok(tokens) => {
                self.store.set_access_token(&tokens.access).await?;
                if let Some(rotated) = tokens.refresh.as_deref() {
                    self.store.set_refresh_token(rotated).await?;
                }
                info!(rotated = tokens.refresh.is_some(), "access token refreshed");
                self.events.publish(SessionEvent::TokenRefreshed);
                Ok(())
            }
            Err(err) => {
                Err(self.terminate(&mut generation, "token refresh failed", Some(err)).await)
            }
        }
    }

    async fn request_access_token(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        let body = RefreshRequest { refresh: refresh_token.to_string() };
        let request = ApiRequest::post(TOKEN_REFRESH_PATH).json(&body)?;
        let response = self.send_once(&request, None).await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Self::decode(response).await
    }

    /// Clear the session, publish `Terminated` and build the error to return.
    ///
    /// Callers hold the `generation` lock.
    async fn terminate(
        &self,
        generation: &mut u64,
        reason: &str,
        cause: Option<ApiError>,
    ) -> ApiError {
        match &cause {
            Some(err) => warn!(reason, error = %err, "terminating session"),
            None => warn!(reason, "terminating session"),
        }

        *generation += 1;
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear session store");
        }

        self.events.publish(SessionEvent::Terminated { reason: reason.to_string() });
        ApiError::terminated(reason, cause)
    }
}
