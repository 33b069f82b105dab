//! Configuration structures
//!
//! Every section has serde defaults so a partial JSON/TOML file (or none at
//! all) still yields a usable configuration. Loading lives in
//! `casefile-infra::config`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ALLOWED_IMAGE_TYPES, DEFAULT_API_BASE_URL, DEFAULT_KEYCHAIN_SERVICE,
    DEFAULT_MAX_IMAGE_BYTES, DEFAULT_MAX_PDF_BYTES, DEFAULT_SESSION_FILE, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};
use crate::errors::{CasefileError, Result};

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub uploads: UploadConfig,
}

impl Config {
    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    /// Returns `CasefileError::Config` for an empty base URL, a zero timeout,
    /// or a file backend without a path.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(CasefileError::Config("api.base_url must not be empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(CasefileError::Config("api.timeout_secs must be greater than zero".into()));
        }
        if self.storage.backend == StorageBackend::File && self.storage.path.is_none() {
            return Err(CasefileError::Config(
                "storage.path is required for the file backend".into(),
            ));
        }
        Ok(())
    }
}

/// Remote API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Versioned base URL; resource paths are joined onto it.
    pub base_url: String,
    /// Overall request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Where the session slots are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory only; the session ends with the process.
    #[default]
    Memory,
    /// JSON document on disk.
    File,
    /// Platform keychain.
    Keychain,
}

impl FromStr for StorageBackend {
    type Err = CasefileError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "keychain" => Ok(Self::Keychain),
            other => Err(CasefileError::Config(format!("Unknown storage backend: {other}"))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::File => f.write_str("file"),
            Self::Keychain => f.write_str("keychain"),
        }
    }
}

/// Session storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Session file, used by the file backend.
    pub path: Option<PathBuf>,
    /// Keychain service name, used by the keychain backend.
    pub service_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: None,
            service_name: DEFAULT_KEYCHAIN_SERVICE.to_string(),
        }
    }
}

impl StorageConfig {
    /// Path for the file backend, falling back to the default file name in
    /// the working directory.
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE))
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = CasefileError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(CasefileError::Config(format!("Unknown log format: {other}"))),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::default() }
    }
}

/// Upload validation limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_image_bytes: u64,
    pub max_pdf_bytes: u64,
    pub allowed_image_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_pdf_bytes: DEFAULT_MAX_PDF_BYTES,
            allowed_image_types: DEFAULT_ALLOWED_IMAGE_TYPES
                .iter()
                .map(|ty| (*ty).to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_api() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8000/api/");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.uploads.max_image_bytes, 5 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[api]
base_url = "https://casefile.example.org/api/"

[storage]
backend = "file"
path = "/tmp/session.json"
"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://casefile.example.org/api/");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.service_name, "Casefile.session");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(CasefileError::Config(_))));
    }

    #[test]
    fn validate_requires_path_for_file_backend() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::File;
        assert!(config.validate().is_err());

        config.storage.path = Some(PathBuf::from("/tmp/session.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn storage_backend_parses_case_insensitively() {
        assert_eq!("Keychain".parse::<StorageBackend>().unwrap(), StorageBackend::Keychain);
        assert_eq!(" file ".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert!("redis".parse::<StorageBackend>().is_err());
    }
}
