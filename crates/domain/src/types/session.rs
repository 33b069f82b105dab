//! Session state owned by the session client

use serde::{Deserialize, Serialize};

use super::user::CurrentUser;

/// Token pair plus the user they were issued for
///
/// Any field may be absent: a fresh install has none, and a session whose
/// refresh token was never issued still carries the other two.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user: Option<CurrentUser>,
}

impl Session {
    /// Session created by a successful login.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        current_user: CurrentUser,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            current_user: Some(current_user),
        }
    }

    /// True when no slot holds a value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.current_user.is_none()
    }

    #[must_use]
    pub const fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Username of the stored user, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.current_user.as_ref().map(|user| user.username.as_str())
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("current_user", &self.current_user)
            .finish()
    }
}
