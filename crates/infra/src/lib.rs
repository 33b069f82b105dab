//! # Casefile Infrastructure
//!
//! I/O side of the Casefile session client.
//!
//! This crate contains:
//! - The reqwest-based HTTP transport
//! - The authenticated session client and its error taxonomy
//! - The JSON file session store
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Session persistence goes through `casefile_common::SessionStore`
//! - Depends on `casefile-domain` for payloads and configuration
//! - Contains all "impure" code (network, file system)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod storage;

// Re-export commonly used items
pub use api::{ApiError, ApiErrorCategory, ApiRequest, Resource, SessionClient, SessionEvent};
pub use http::{HttpClient, HttpClientBuilder};
pub use storage::{open_store, FileSessionStore};
