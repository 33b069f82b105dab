//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `CASEFILE_API_BASE_URL` is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//! 5. With no file anywhere, the built-in defaults are used
//!
//! ## Environment Variables
//! - `CASEFILE_API_BASE_URL`: API base URL (required for env loading)
//! - `CASEFILE_API_TIMEOUT_SECS`: Request timeout in seconds
//! - `CASEFILE_STORAGE_BACKEND`: `memory`, `file` or `keychain`
//! - `CASEFILE_STORAGE_PATH`: Session file for the file backend
//! - `CASEFILE_LOG_LEVEL`: Default tracing filter
//! - `CASEFILE_LOG_FORMAT`: `pretty` or `json`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./casefile.json` or `./casefile.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use casefile_domain::{CasefileError, Config, LogFormat, Result, StorageBackend};

use crate::api::client::parse_base_url;

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables, then from a probed
/// config file, then falls back to defaults. The result is validated.
///
/// # Errors
/// Returns `CasefileError::Config` if:
/// - An environment variable or file holds an invalid value
/// - File format is invalid
/// - The resulting configuration fails validation
pub fn load() -> Result<Config> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path))?,
                None => {
                    tracing::info!("No config file found, using defaults");
                    Config::default()
                }
            }
        }
    };

    validate(&config)?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `CASEFILE_API_BASE_URL` must be present; every other variable is
/// optional and falls back to its default.
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `CasefileError::Config` if the base URL is missing or a variable
/// has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.api.base_url = env_var("CASEFILE_API_BASE_URL")?;

    if let Some(timeout) = env_opt("CASEFILE_API_TIMEOUT_SECS") {
        config.api.timeout_secs = timeout
            .parse::<u64>()
            .map_err(|e| CasefileError::Config(format!("Invalid request timeout: {}", e)))?;
    }

    if let Some(backend) = env_opt("CASEFILE_STORAGE_BACKEND") {
        config.storage.backend = backend.parse::<StorageBackend>()?;
    }
    config.storage.path = env_opt("CASEFILE_STORAGE_PATH").map(PathBuf::from);

    if let Some(level) = env_opt("CASEFILE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = env_opt("CASEFILE_LOG_FORMAT") {
        config.logging.format = format.parse::<LogFormat>()?;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `CasefileError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CasefileError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CasefileError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CasefileError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Structural checks plus a parse of the base URL.
///
/// # Errors
/// Returns `CasefileError::Config` describing the first problem found.
pub fn validate(config: &Config) -> Result<()> {
    config.validate()?;
    parse_base_url(&config.api.base_url).map_err(|e| CasefileError::Config(e.to_string()))?;
    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `CasefileError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CasefileError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CasefileError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CasefileError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./casefile.{json,toml}`,
///    `./config.{json,toml}`)
/// 2. Parent directory
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
        candidates.extend(vec![cwd.join("../config.json"), cwd.join("../config.toml")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    ["casefile.json", "casefile.toml", "config.json", "config.toml"]
        .iter()
        .map(|name| dir.join(name))
        .collect()
}

/// Get required environment variable
///
/// # Errors
/// Returns `CasefileError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        CasefileError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional environment variable; blank values count as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ENV_KEYS: [&str; 6] = [
        "CASEFILE_API_BASE_URL",
        "CASEFILE_API_TIMEOUT_SECS",
        "CASEFILE_STORAGE_BACKEND",
        "CASEFILE_STORAGE_PATH",
        "CASEFILE_LOG_LEVEL",
        "CASEFILE_LOG_FORMAT",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    fn temp_config(contents: &str, extension: &str) -> PathBuf {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        path
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("CASEFILE_API_BASE_URL", "https://casefile.example.org/api/");
        std::env::set_var("CASEFILE_API_TIMEOUT_SECS", "12");
        std::env::set_var("CASEFILE_STORAGE_BACKEND", "file");
        std::env::set_var("CASEFILE_STORAGE_PATH", "/tmp/casefile-session.json");
        std::env::set_var("CASEFILE_LOG_LEVEL", "debug");
        std::env::set_var("CASEFILE_LOG_FORMAT", "json");

        let result = load_from_env();
        assert!(result.is_ok(), "Should load config from env vars, error: {:?}", result.err());

        let config = result.unwrap();
        assert_eq!(config.api.base_url, "https://casefile.example.org/api/");
        assert_eq!(config.api.timeout_secs, 12);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/casefile-session.json")));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);

        clear_env();
    }

    #[test]
    fn test_load_from_env_only_base_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("CASEFILE_API_BASE_URL", "http://10.0.0.5:8000/api/");

        let config = load_from_env().unwrap();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.logging.level, "info");

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let result = load_from_env();
        assert!(matches!(result, Err(CasefileError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_values() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("CASEFILE_API_BASE_URL", "http://127.0.0.1:8000/api/");
        std::env::set_var("CASEFILE_API_TIMEOUT_SECS", "not-a-number");
        assert!(matches!(load_from_env(), Err(CasefileError::Config(_))));

        std::env::set_var("CASEFILE_API_TIMEOUT_SECS", "5");
        std::env::set_var("CASEFILE_STORAGE_BACKEND", "redis");
        assert!(matches!(load_from_env(), Err(CasefileError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_validates_env_config() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("CASEFILE_API_BASE_URL", "not a url");
        assert!(matches!(load(), Err(CasefileError::Config(_))));

        std::env::set_var("CASEFILE_API_BASE_URL", "http://127.0.0.1:8000/api/");
        std::env::set_var("CASEFILE_API_TIMEOUT_SECS", "0");
        assert!(matches!(load(), Err(CasefileError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let path = temp_config(
            r#"{
                "api": {"base_url": "https://casefile.example.org/api/", "timeout_secs": 10},
                "storage": {"backend": "keychain", "service_name": "Casefile.test"}
            }"#,
            "json",
        );

        let config = load_from_file(Some(path.clone())).expect("Should load config from JSON file");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.storage.backend, StorageBackend::Keychain);
        assert_eq!(config.storage.service_name, "Casefile.test");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_toml() {
        let path = temp_config(
            r#"
[api]
base_url = "https://casefile.example.org/api/"

[logging]
level = "casefile_infra=debug,info"
format = "json"
"#,
            "toml",
        );

        let config = load_from_file(Some(path.clone())).expect("Should load config from TOML file");
        assert_eq!(config.api.base_url, "https://casefile.example.org/api/");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.api.timeout_secs, 30);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/casefile.json")));
        assert!(matches!(result, Err(CasefileError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let path = temp_config(r#"{ "this is": "not valid json" "#, "json");

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_err(), "Should fail with invalid JSON");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", &PathBuf::from("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }

    #[test]
    fn test_validate_rejects_unparsable_base_url() {
        let mut config = Config::default();
        config.api.base_url = "://missing-scheme".into();
        assert!(matches!(validate(&config), Err(CasefileError::Config(_))));

        config.api.base_url = "http://127.0.0.1:8000/api".into();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_candidates_prefer_casefile_names() {
        let names: Vec<_> = candidates_in(Path::new("/etc/casefile"))
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["casefile.json", "casefile.toml", "config.json", "config.toml"]);
    }
}
