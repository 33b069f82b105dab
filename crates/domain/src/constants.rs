//! Application constants
//!
//! Endpoint paths and defaults shared by the configuration layer and the
//! session client.

// API defaults
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("casefile/", env!("CARGO_PKG_VERSION"));

// Authentication endpoints (relative to the API base URL)
pub const LOGIN_PATH: &str = "auth/login/";
pub const REGISTER_PATH: &str = "auth/registro/";
pub const PROFILE_PATH: &str = "auth/perfil/";
pub const CHANGE_PASSWORD_PATH: &str = "auth/cambiar-password/";
pub const TOKEN_REFRESH_PATH: &str = "token/refresh/";

// Session storage
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "Casefile.session";
pub const DEFAULT_SESSION_FILE: &str = "casefile-session.json";

// Upload limits
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_MAX_PDF_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_ALLOWED_IMAGE_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/jpg", "image/gif", "image/webp"];
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
