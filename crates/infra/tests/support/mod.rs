//! Shared harness for session client integration tests

use std::sync::Arc;
use std::time::Duration;

use casefile_common::testing::RecordingSessionStore;
use casefile_domain::{CurrentUser, Session};
use casefile_infra::api::SessionEvent;
use casefile_infra::SessionClient;
use tokio::sync::broadcast;
use wiremock::MockServer;

/// Mock API server plus a client wired to a recording store.
pub struct Harness {
    pub server: MockServer,
    pub store: Arc<RecordingSessionStore>,
    pub client: Arc<SessionClient>,
    pub events: broadcast::Receiver<SessionEvent>,
}

impl Harness {
    /// Harness whose store holds the given tokens and a user record.
    pub async fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
        let session = Session {
            access_token: access.map(str::to_string),
            refresh_token: refresh.map(str::to_string),
            current_user: Some(CurrentUser::new("alice")),
        };
        Self::build(RecordingSessionStore::with_session(&session), Duration::from_secs(5)).await
    }

    /// Harness with an empty store.
    pub async fn empty() -> Self {
        Self::build(RecordingSessionStore::new(), Duration::from_secs(5)).await
    }

    pub async fn build(store: RecordingSessionStore, timeout: Duration) -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(store);
        let client = SessionClient::builder()
            .base_url(format!("{}/api/", server.uri()))
            .timeout(timeout)
            .store(store.clone())
            .build()
            .expect("session client should build");
        let events = client.subscribe();

        Self { server, store, client: Arc::new(client), events }
    }

    /// Events published so far, without waiting.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            seen.push(event);
        }
        seen
    }
}
