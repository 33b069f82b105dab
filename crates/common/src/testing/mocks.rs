//! Mock implementations of the session store
//!
//! Provides store doubles for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use casefile_domain::Session;

use crate::session::{MemorySessionStore, SessionSlot, SessionStore, StoreError};

/// In-memory store that records every write
///
/// # Examples
///
/// ```
/// use casefile_common::testing::RecordingSessionStore;
/// use casefile_common::{SessionSlot, SessionStore};
///
/// # tokio_test::block_on(async {
/// let store = RecordingSessionStore::new();
/// store.set(SessionSlot::AccessToken, "token").await.unwrap();
/// store.clear().await.unwrap();
///
/// assert_eq!(store.clear_count(), 1);
/// assert_eq!(store.writes(), vec![SessionSlot::AccessToken]);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct RecordingSessionStore {
    inner: MemorySessionStore,
    writes: Mutex<Vec<SessionSlot>>,
    clears: AtomicUsize,
}

impl RecordingSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recording store pre-populated with `session`.
    pub fn with_session(session: &Session) -> Self {
        Self {
            inner: MemorySessionStore::with_session(session).unwrap(),
            writes: Mutex::new(Vec::new()),
            clears: AtomicUsize::new(0),
        }
    }

    /// Number of `clear` calls so far.
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    /// Slots written by `set`, in call order.
    pub fn writes(&self) -> Vec<SessionSlot> {
        // SAFETY: Mutex poisoning is acceptable in test mocks
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionStore for RecordingSessionStore {
    async fn get(&self, slot: SessionSlot) -> Result<Option<String>, StoreError> {
        self.inner.get(slot).await
    }

    async fn set(&self, slot: SessionSlot, value: &str) -> Result<(), StoreError> {
        self.writes.lock().unwrap().push(slot);
        self.inner.set(slot, value).await
    }

    async fn remove(&self, slot: SessionSlot) -> Result<(), StoreError> {
        self.inner.remove(slot).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear().await
    }
}

/// Store whose every operation fails with `StoreError::Unavailable`
#[derive(Debug, Clone, Default)]
pub struct FailingSessionStore;

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn get(&self, _slot: SessionSlot) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("storage offline".to_string()))
    }

    async fn set(&self, _slot: SessionSlot, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage offline".to_string()))
    }

    async fn remove(&self, _slot: SessionSlot) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage offline".to_string()))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage offline".to_string()))
    }
}
