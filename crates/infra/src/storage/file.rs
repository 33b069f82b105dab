//! JSON file session store
//!
//! The three slots live in one small JSON object keyed by slot name. Every
//! write replaces the whole document through a temp file and a rename, so
//! readers never observe a half-written session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use casefile_common::{SessionSlot, SessionStore, StoreError};
use casefile_domain::Session;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

type Document = BTreeMap<String, String>;

/// Session store persisted as a JSON file
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Document, StoreError> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&data).map_err(|e| {
            StoreError::Malformed(format!("{} is not a session document: {e}", self.path.display()))
        })
    }

    async fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        if document.is_empty() {
            return self.remove_file().await;
        }

        let data = serde_json::to_vec_pretty(document)
            .map_err(|e| StoreError::Malformed(format!("Failed to encode session: {e}")))?;

        let temp_path = self.path.with_extension("tmp");
        if let Some(parent) = temp_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        debug!(path = %self.path.display(), slots = document.len(), "session file written");
        Ok(())
    }

    async fn remove_file(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, slot: SessionSlot) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_document().await?.remove(slot.key()))
    }

    async fn set(&self, slot: SessionSlot, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(slot.key().to_string(), value.to_string());
        self.write_document(&document).await
    }

    async fn remove(&self, slot: SessionSlot) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        if document.remove(slot.key()).is_none() {
            return Ok(());
        }
        self.write_document(&document).await
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.remove_file().await
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let mut document = Document::new();
        if let Some(token) = &session.access_token {
            document.insert(SessionSlot::AccessToken.key().to_string(), token.clone());
        }
        if let Some(token) = &session.refresh_token {
            document.insert(SessionSlot::RefreshToken.key().to_string(), token.clone());
        }
        if let Some(user) = &session.current_user {
            let raw = serde_json::to_string(user).map_err(|e| StoreError::Corrupt {
                slot: SessionSlot::CurrentUser,
                message: e.to_string(),
            })?;
            document.insert(SessionSlot::CurrentUser.key().to_string(), raw);
        }

        let _guard = self.lock.lock().await;
        self.write_document(&document).await
    }
}

#[cfg(test)]
mod tests {
    use casefile_domain::CurrentUser;
    use tempfile::TempDir;

    use super::*;

    fn store_in(dir: &TempDir) -> FileSessionStore {
        FileSessionStore::new(dir.path().join("session.json"))
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty_session() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.load().await.unwrap(), Session::default());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn session_survives_a_new_store_instance() {
        let dir = TempDir::new().unwrap();
        let session = Session::new("a1", "r1", CurrentUser::new("alice"));
        store_in(&dir).save(&session).await.unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.load().await.unwrap(), session);
        assert!(!dir.path().join("session.tmp").exists());
    }

    #[tokio::test]
    async fn set_keeps_other_slots() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&Session::new("a1", "r1", CurrentUser::new("alice"))).await.unwrap();

        store.set_access_token("a2").await.unwrap();

        assert_eq!(store.access_token().await.unwrap().as_deref(), Some("a2"));
        assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn clear_deletes_the_file_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_refresh_token("r1").await.unwrap();
        assert!(store.path().exists());

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(!store.path().exists());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn garbage_file_is_malformed() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), b"not json").unwrap();

        assert!(matches!(store.access_token().await, Err(StoreError::Malformed(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_access_token("a1").await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
