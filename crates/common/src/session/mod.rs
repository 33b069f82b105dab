//! Session persistence
//!
//! The session client never touches storage directly: it receives a
//! [`SessionStore`] at construction and reads the current token from it on
//! every request. A store exposes three named slots and an all-at-once
//! clear.
//!
//! # Module Organization
//!
//! - **[`memory`]**: process-local store
//! - **`keychain`**: platform keychain store (feature `platform`)
//!
//! The JSON file store lives in `casefile-infra` next to the other I/O code.

use std::fmt;

use async_trait::async_trait;
use casefile_domain::{CurrentUser, Session};
use thiserror::Error;

#[cfg(feature = "platform")]
mod keychain;
pub mod memory;

#[cfg(feature = "platform")]
pub use keychain::KeychainSessionStore;
pub use memory::MemorySessionStore;

/// One of the three persisted session values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionSlot {
    AccessToken,
    RefreshToken,
    CurrentUser,
}

impl SessionSlot {
    /// Every slot, in a stable order.
    pub const ALL: [Self; 3] = [Self::AccessToken, Self::RefreshToken, Self::CurrentUser];

    /// Storage key for the slot.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::CurrentUser => "current_user",
        }
    }
}

impl fmt::Display for SessionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error type for session store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing storage could not be reached
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// A slot holds a value that cannot be decoded
    #[error("corrupt session slot {slot}: {message}")]
    Corrupt { slot: SessionSlot, message: String },

    /// The backing document as a whole cannot be decoded
    #[error("malformed session data: {0}")]
    Malformed(String),

    /// File-system failure
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistent home of the session
///
/// Implementations provide slot-level `get`/`set`/`remove` and a `clear`
/// that empties all three slots. Session-level helpers are provided on top;
/// stores that can write several slots at once override [`save`].
///
/// [`save`]: SessionStore::save
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a slot
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be read
    async fn get(&self, slot: SessionSlot) -> Result<Option<String>, StoreError>;

    /// Write a slot, replacing any previous value
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be written
    async fn set(&self, slot: SessionSlot, value: &str) -> Result<(), StoreError>;

    /// Remove a slot (idempotent)
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be written
    async fn remove(&self, slot: SessionSlot) -> Result<(), StoreError>;

    /// Remove all three slots (idempotent)
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be written
    async fn clear(&self) -> Result<(), StoreError>;

    async fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.get(SessionSlot::AccessToken).await
    }

    async fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.get(SessionSlot::RefreshToken).await
    }

    async fn set_access_token(&self, token: &str) -> Result<(), StoreError> {
        self.set(SessionSlot::AccessToken, token).await
    }

    async fn set_refresh_token(&self, token: &str) -> Result<(), StoreError> {
        self.set(SessionSlot::RefreshToken, token).await
    }

    /// Decode the stored user record
    ///
    /// # Errors
    /// Returns `StoreError::Corrupt` if the slot does not hold a user record
    async fn current_user(&self) -> Result<Option<CurrentUser>, StoreError> {
        match self.get(SessionSlot::CurrentUser).await? {
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| StoreError::Corrupt {
                slot: SessionSlot::CurrentUser,
                message: e.to_string(),
            }),
            None => Ok(None),
        }
    }

    async fn set_current_user(&self, user: &CurrentUser) -> Result<(), StoreError> {
        let raw = serde_json::to_string(user).map_err(|e| StoreError::Corrupt {
            slot: SessionSlot::CurrentUser,
            message: e.to_string(),
        })?;
        self.set(SessionSlot::CurrentUser, &raw).await
    }

    /// True when none of the three slots holds a value.
    async fn is_empty(&self) -> Result<bool, StoreError> {
        for slot in SessionSlot::ALL {
            if self.get(slot).await?.is_some() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Signed in means a user record is stored.
    async fn is_authenticated(&self) -> Result<bool, StoreError> {
        Ok(self.get(SessionSlot::CurrentUser).await?.is_some())
    }

    /// Read all three slots
    ///
    /// # Errors
    /// Returns error if any slot cannot be read or decoded
    async fn load(&self) -> Result<Session, StoreError> {
        Ok(Session {
            access_token: self.access_token().await?,
            refresh_token: self.refresh_token().await?,
            current_user: self.current_user().await?,
        })
    }

    /// Write all three slots; absent values are removed
    ///
    /// # Errors
    /// Returns error if any slot cannot be written
    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        match &session.access_token {
            Some(token) => self.set_access_token(token).await?,
            None => self.remove(SessionSlot::AccessToken).await?,
        }
        match &session.refresh_token {
            Some(token) => self.set_refresh_token(token).await?,
            None => self.remove(SessionSlot::RefreshToken).await?,
        }
        match &session.current_user {
            Some(user) => self.set_current_user(user).await?,
            None => self.remove(SessionSlot::CurrentUser).await?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_keys_are_stable() {
        assert_eq!(SessionSlot::AccessToken.key(), "access_token");
        assert_eq!(SessionSlot::RefreshToken.key(), "refresh_token");
        assert_eq!(SessionSlot::CurrentUser.key(), "current_user");
        assert_eq!(SessionSlot::ALL.len(), 3);
    }

    #[tokio::test]
    async fn corrupt_user_slot_is_reported() {
        let store = MemorySessionStore::new();
        store.set(SessionSlot::CurrentUser, "not json").await.unwrap();

        let err = store.current_user().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { slot: SessionSlot::CurrentUser, .. }));
    }

    #[tokio::test]
    async fn save_removes_absent_slots() {
        let store = MemorySessionStore::new();
        store.save(&Session::new("a", "r", CurrentUser::new("alice"))).await.unwrap();

        let partial = Session { access_token: Some("a2".to_string()), ..Session::default() };
        store.save(&partial).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, partial);
        assert!(!store.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn is_empty_tracks_any_slot() {
        let store = MemorySessionStore::new();
        assert!(store.is_empty().await.unwrap());

        store.set_refresh_token("r").await.unwrap();
        assert!(!store.is_empty().await.unwrap());

        store.clear().await.unwrap();
        assert!(store.is_empty().await.unwrap());
    }
}
