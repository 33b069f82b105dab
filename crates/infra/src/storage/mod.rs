//! Session store selection
//!
//! Memory and keychain stores come from `casefile-common`; the file store
//! lives here with the rest of the file-system code.

pub mod file;

use std::sync::Arc;

use casefile_common::{KeychainSessionStore, MemorySessionStore, SessionStore, StoreError};
use casefile_domain::{StorageBackend, StorageConfig};
use tracing::info;

pub use file::FileSessionStore;

/// Open the store selected by `config`.
///
/// # Errors
/// Returns `StoreError::Unavailable` if the configured backend cannot be used
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn SessionStore>, StoreError> {
    info!(backend = %config.backend, "opening session store");

    let store: Arc<dyn SessionStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemorySessionStore::new()),
        StorageBackend::File => Arc::new(FileSessionStore::new(config.file_path())),
        StorageBackend::Keychain => {
            if config.service_name.trim().is_empty() {
                return Err(StoreError::Unavailable(
                    "keychain backend requires a service name".into(),
                ));
            }
            Arc::new(KeychainSessionStore::new(config.service_name.clone()))
        }
    };

    Ok(store)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[tokio::test]
    async fn memory_backend_starts_empty() {
        let store = open_store(&StorageConfig::default()).unwrap();
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn file_backend_uses_configured_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path: PathBuf = dir.path().join("s.json");
        let config = StorageConfig {
            backend: StorageBackend::File,
            path: Some(path.clone()),
            ..StorageConfig::default()
        };

        let store = open_store(&config).unwrap();
        store.set_access_token("a1").await.unwrap();
        assert!(path.exists());
    }

    #[test]
    fn keychain_backend_needs_service_name() {
        let config = StorageConfig {
            backend: StorageBackend::Keychain,
            service_name: " ".into(),
            ..StorageConfig::default()
        };
        assert!(matches!(open_store(&config), Err(StoreError::Unavailable(_))));
    }
}
