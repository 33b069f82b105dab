//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! turning it into a working session client.

use std::io::Write;

use casefile_common::SessionStore;
use casefile_domain::constants::DEFAULT_TIMEOUT_SECS;
use casefile_domain::StorageBackend;
use casefile_infra::{config, SessionClient};
use tempfile::{NamedTempFile, TempDir};

fn write_config(contents: &str, extension: &str) -> std::path::PathBuf {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    path
}

#[test]
fn test_load_config_from_json_file() {
    let path = write_config(
        r#"{
            "api": {
                "base_url": "https://casefile.example.org/api/",
                "timeout_secs": 15
            },
            "storage": {
                "backend": "file",
                "path": "/tmp/casefile-integration-session.json"
            },
            "uploads": {
                "max_image_bytes": 1048576
            }
        }"#,
        "json",
    );

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load JSON config");

    assert_eq!(config.api.base_url, "https://casefile.example.org/api/");
    assert_eq!(config.api.timeout_secs, 15);
    assert_eq!(config.storage.backend, StorageBackend::File);
    assert_eq!(config.uploads.max_image_bytes, 1_048_576);
    assert_eq!(config.uploads.max_pdf_bytes, 10 * 1024 * 1024);
    assert!(config::validate(&config).is_ok());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_toml_file() {
    let path = write_config(
        r#"
[api]
base_url = "http://127.0.0.1:8000/api/"

[storage]
backend = "memory"
"#,
        "toml",
    );

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load TOML config");

    assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert_eq!(config.storage.backend, StorageBackend::Memory);

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_client_from_file_backed_config() {
    let dir = TempDir::new().expect("temp dir");
    let session_path = dir.path().join("session.json");
    let path = write_config(
        &format!(
            r#"{{
                "api": {{"base_url": "http://127.0.0.1:8000/api"}},
                "storage": {{"backend": "file", "path": {:?}}}
            }}"#,
            session_path.display().to_string()
        ),
        "json",
    );

    let config = config::load_from_file(Some(path.clone())).expect("config");
    let client = SessionClient::from_config(&config).expect("client from config");

    assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8000/api/");
    client.store().set_access_token("a1").await.expect("write through configured store");
    assert!(session_path.exists());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_client_from_invalid_config_is_rejected() {
    let mut config = casefile_domain::Config::default();
    config.api.timeout_secs = 0;

    assert!(SessionClient::from_config(&config).is_err());
}
