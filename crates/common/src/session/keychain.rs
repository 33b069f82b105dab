//! Keychain-backed session store
//!
//! Each slot is a separate keychain entry named `{slot}.{account}` under the
//! configured service, e.g. `access_token.default` in `Casefile.session`.
//! A missing entry reads as an absent slot and deleting a missing entry is
//! not an error.

use async_trait::async_trait;
use keyring::Entry;
use tracing::debug;

use super::{SessionSlot, SessionStore, StoreError};

/// Session store over the platform keychain (macOS Keychain, Windows
/// Credential Manager, Linux Secret Service)
#[derive(Debug, Clone)]
pub struct KeychainSessionStore {
    service_name: String,
    account: String,
}

impl KeychainSessionStore {
    /// Create a store for `service_name`, using the `default` account.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self::with_account(service_name, "default")
    }

    /// Create a store whose entries are namespaced by `account`.
    pub fn with_account(service_name: impl Into<String>, account: impl Into<String>) -> Self {
        Self { service_name: service_name.into(), account: account.into() }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, slot: SessionSlot) -> Result<Entry, StoreError> {
        let key = format!("{}.{}", slot.key(), self.account);
        Entry::new(&self.service_name, &key).map_err(|e| {
            StoreError::Unavailable(format!("Failed to open keychain entry {key}: {e}"))
        })
    }
}

#[async_trait]
impl SessionStore for KeychainSessionStore {
    async fn get(&self, slot: SessionSlot) -> Result<Option<String>, StoreError> {
        debug!(service = %self.service_name, %slot, "Reading session slot from keychain");

        match self.entry(slot)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::Unavailable(format!("Failed to read {slot}: {e}"))),
        }
    }

    async fn set(&self, slot: SessionSlot, value: &str) -> Result<(), StoreError> {
        debug!(service = %self.service_name, %slot, "Writing session slot to keychain");

        self.entry(slot)?
            .set_password(value)
            .map_err(|e| StoreError::Unavailable(format!("Failed to store {slot}: {e}")))
    }

    async fn remove(&self, slot: SessionSlot) -> Result<(), StoreError> {
        match self.entry(slot)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::Unavailable(format!("Failed to delete {slot}: {e}"))),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        debug!(service = %self.service_name, "Clearing session from keychain");

        for slot in SessionSlot::ALL {
            self.remove(slot).await?;
        }
        Ok(())
    }
}
