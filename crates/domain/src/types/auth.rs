//! Authentication payloads exchanged with the API
//!
//! Field names follow the wire format of the backend (`access`, `refresh`,
//! `password_actual`, ...).

use serde::{Deserialize, Serialize};

use super::session::Session;
use super::user::CurrentUser;

/// Credentials posted to the login endpoint
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Access/refresh token pair as issued by the API
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenPair { .. }")
    }
}

/// Login response
///
/// The backend nests the pair under `tokens`; older deployments return
/// `access`/`refresh` at the top level. Both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
    #[serde(default)]
    tokens: Option<TokenPair>,
    pub user: CurrentUser,
    #[serde(default)]
    pub message: Option<String>,
}

impl LoginResponse {
    /// Token pair from whichever shape the server used.
    #[must_use]
    pub fn token_pair(&self) -> Option<TokenPair> {
        if let Some(tokens) = &self.tokens {
            return Some(tokens.clone());
        }
        match (&self.access, &self.refresh) {
            (Some(access), Some(refresh)) => {
                Some(TokenPair { access: access.clone(), refresh: refresh.clone() })
            }
            _ => None,
        }
    }

    /// Build the session to persist, or `None` when the pair is incomplete.
    #[must_use]
    pub fn into_session(self) -> Option<Session> {
        let pair = self.token_pair()?;
        Some(Session::new(pair.access, pair.refresh, self.user))
    }
}

/// Body of the token refresh call
#[derive(Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Refresh response; `refresh` is present when the server rotates tokens.
#[derive(Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Result of a registration call
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub message: Option<String>,
    pub user: CurrentUser,
    #[serde(default)]
    pub tokens: Option<TokenPair>,
}

/// `{ "message", "user" }` envelope returned by profile updates
#[derive(Debug, Clone, Deserialize)]
pub struct UserEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    pub user: CurrentUser,
}

/// Password change request
#[derive(Clone, Serialize)]
pub struct PasswordChange {
    #[serde(rename = "password_actual")]
    pub current_password: String,
    #[serde(rename = "password_nueva")]
    pub new_password: String,
}

/// Generic `{ "message": ... }` acknowledgement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn login_response_accepts_nested_tokens() {
        let response: LoginResponse = serde_json::from_value(json!({
            "message": "Login exitoso",
            "user": {"id": 1, "username": "alice"},
            "tokens": {"access": "a1", "refresh": "r1"}
        }))
        .unwrap();

        let session = response.into_session().unwrap();
        assert_eq!(session.access_token.as_deref(), Some("a1"));
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
        assert_eq!(session.username(), Some("alice"));
    }

    #[test]
    fn login_response_accepts_flat_tokens() {
        let response: LoginResponse = serde_json::from_value(json!({
            "access": "a2",
            "refresh": "r2",
            "user": {"username": "alice"}
        }))
        .unwrap();

        let pair = response.token_pair().unwrap();
        assert_eq!(pair.access, "a2");
        assert_eq!(pair.refresh, "r2");
    }

    #[test]
    fn login_response_without_refresh_has_no_session() {
        let response: LoginResponse = serde_json::from_value(json!({
            "access": "a3",
            "user": {"username": "alice"}
        }))
        .unwrap();

        assert!(response.into_session().is_none());
    }

    #[test]
    fn password_change_uses_wire_names() {
        let body = PasswordChange {
            current_password: "old".to_string(),
            new_password: "new".to_string(),
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"password_actual": "old", "password_nueva": "new"})
        );
    }

    #[test]
    fn login_request_debug_hides_password() {
        let request = LoginRequest::new("alice", "secret");
        assert!(!format!("{request:?}").contains("secret"));
    }
}
