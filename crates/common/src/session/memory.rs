//! In-memory session store

use std::collections::HashMap;

use async_trait::async_trait;
use casefile_domain::Session;
use tokio::sync::RwLock;

use super::{SessionSlot, SessionStore, StoreError};

/// Process-local store; the session ends with the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slots: RwLock<HashMap<SessionSlot, String>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `session`.
    ///
    /// # Errors
    /// Returns `StoreError::Corrupt` if the user record cannot be encoded
    pub fn with_session(session: &Session) -> Result<Self, StoreError> {
        let mut slots = HashMap::new();
        if let Some(token) = &session.access_token {
            slots.insert(SessionSlot::AccessToken, token.clone());
        }
        if let Some(token) = &session.refresh_token {
            slots.insert(SessionSlot::RefreshToken, token.clone());
        }
        if let Some(user) = &session.current_user {
            let raw = serde_json::to_string(user).map_err(|e| StoreError::Corrupt {
                slot: SessionSlot::CurrentUser,
                message: e.to_string(),
            })?;
            slots.insert(SessionSlot::CurrentUser, raw);
        }
        Ok(Self { slots: RwLock::new(slots) })
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, slot: SessionSlot) -> Result<Option<String>, StoreError> {
        Ok(self.slots.read().await.get(&slot).cloned())
    }

    async fn set(&self, slot: SessionSlot, value: &str) -> Result<(), StoreError> {
        self.slots.write().await.insert(slot, value.to_string());
        Ok(())
    }

    async fn remove(&self, slot: SessionSlot) -> Result<(), StoreError> {
        self.slots.write().await.remove(&slot);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.slots.write().await.clear();
        Ok(())
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let replacement = Self::with_session(session)?.slots.into_inner();
        *self.slots.write().await = replacement;
        Ok(())
    }
}
